//! # Repository Module
//!
//! Database repository implementations for the POS transaction core.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Request Handler                                                       │
//! │       │                                                                 │
//! │       │  db.sales().create_sale(request, user_id)                      │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  SaleRepository                                                        │
//! │  ├── create_sale(&self, request, user_id)                              │
//! │  ├── cancel_sale(&self, id, user_id)                                   │
//! │  ├── get_by_id(&self, id)                                              │
//! │  ├── list(&self, filter)                                               │
//! │  └── statistics(&self, filter)                                         │
//! │       │                                                                 │
//! │       │  SQL (one write transaction per workflow)                       │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • Clean separation of concerns                                        │
//! │  • SQL is isolated in one place                                        │
//! │  • The stock column has exactly one write path                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`inventory::InventoryRepository`] - Inventory lookup and the stock ledger
//! - [`sale::SaleRepository`] - The sale transaction coordinator, cancellation
//!   workflow, and sale queries
//!
//! The stock-mutating functions in [`inventory`] also come as free functions
//! over `&mut SqliteConnection`, so the sale workflows can call them inside
//! their own transaction.

pub mod inventory;
pub mod sale;
