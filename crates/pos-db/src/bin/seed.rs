//! # Seed Data Generator
//!
//! Populates the database with development data: one store, one operator,
//! a few customers, and a configurable number of inventory items.
//!
//! ## Usage
//! ```bash
//! # Generate 500 inventory items (default)
//! cargo run -p pos-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p pos-db --bin seed -- --count 2000
//!
//! # Specify database path
//! cargo run -p pos-db --bin seed -- --db ./data/pos.db
//! ```
//!
//! ## Generated Items
//! Realistic grocery data across categories (beverages, snacks, dairy,
//! frozen, grocery). Each item has:
//! - Unique code: `{CATEGORY}-{NAME}-{INDEX}`
//! - Deterministic price: $0.99 - $19.99
//! - Deterministic stock: 0 - 100
//! - Tax rate from: 0%, 5%, 8.25%, 10%

use chrono::Utc;
use std::env;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use pos_core::{InventoryItem, ItemStatus};
use pos_db::{Database, DbConfig};

/// Item categories for realistic test data
const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "BEV",
        &[
            "Coca-Cola",
            "Sprite",
            "Fanta",
            "Red Bull",
            "Gatorade",
            "Mineral Water",
            "Orange Juice",
            "Apple Juice",
            "Lemonade",
            "Iced Tea",
        ],
    ),
    (
        "SNK",
        &[
            "Lays Classic",
            "Doritos Nacho",
            "Pringles",
            "Snickers",
            "Kit Kat",
            "Skittles",
            "Oreos",
            "Goldfish",
            "Pretzels",
            "Gummy Bears",
        ],
    ),
    (
        "DRY",
        &[
            "Whole Milk",
            "Skim Milk",
            "Cheddar Cheese",
            "Butter",
            "Greek Yogurt",
            "Sour Cream",
            "Eggs Dozen",
            "Cream Cheese",
            "Mozzarella",
            "Heavy Cream",
        ],
    ),
    (
        "FRZ",
        &[
            "Vanilla Ice Cream",
            "Chocolate Ice Cream",
            "Frozen Pizza",
            "Frozen Vegetables",
            "Popsicles",
            "Fish Sticks",
            "Chicken Nuggets",
            "Frozen Fries",
            "Frozen Waffles",
            "Sorbet",
        ],
    ),
    (
        "GRO",
        &[
            "White Bread",
            "Pasta Spaghetti",
            "Rice White",
            "Canned Beans",
            "Canned Soup",
            "Cereal",
            "Peanut Butter",
            "Honey",
            "Flour",
            "Sugar",
        ],
    ),
];

/// Size variants
const SIZES: &[(&str, i64)] = &[
    ("Small", 0),
    ("Medium", 100),
    ("Large", 200),
    ("12oz", 0),
    ("16oz", 50),
    ("2L", 150),
    ("6-Pack", 300),
    ("12-Pack", 500),
];

/// Tax rates in basis points
const TAX_RATES: &[u32] = &[0, 500, 825, 1000];

const STORE_ID: &str = "store-main";
const USER_ID: &str = "user-cashier";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 500;
    let mut db_path = String::from("./pos_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(500);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of inventory items to generate (default: 500)");
                println!("  -d, --db <PATH>    Database file path (default: ./pos_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 POS Seed Data Generator");
    println!("==========================");
    println!("Database: {}", db_path);
    println!("Items:    {}", count);
    println!();

    // Connect to database
    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Refuse to seed twice
    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM inventory")
        .fetch_one(db.pool())
        .await?;
    if existing > 0 {
        println!("⚠ Database already has {} inventory items", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    seed_reference_rows(&db).await?;
    println!("✓ Store, operator, and customers created");

    // Generate inventory
    println!();
    println!("Generating inventory...");

    let mut generated = 0;
    let start = std::time::Instant::now();

    'outer: for (category_code, names) in CATEGORIES {
        for name in *names {
            for (size_name, price_addon) in SIZES {
                if generated >= count {
                    break 'outer;
                }

                let item = generate_item(category_code, name, size_name, *price_addon, generated);
                if let Err(e) = db.inventory().insert(&item).await {
                    eprintln!("Failed to insert {}: {}", item.code, e);
                    continue;
                }

                generated += 1;
                if generated % 100 == 0 {
                    println!("  Generated {} items...", generated);
                }
            }
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} items in {:?}", generated, elapsed);

    // Verify the low-stock report works against the seeded data
    let low = db.inventory().low_stock(Some(STORE_ID)).await?;
    println!("  Low-stock items: {}", low.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Inserts the store, the operator, and a few customers the inventory and
/// sales reference.
async fn seed_reference_rows(db: &Database) -> Result<(), Box<dyn std::error::Error>> {
    sqlx::query(
        "INSERT INTO stores (id, name, location, status, created_at, updated_at)
         VALUES (?1, 'Main Street Store', 'Main Street 1', 'active', datetime('now'), datetime('now'))",
    )
    .bind(STORE_ID)
    .execute(db.pool())
    .await?;

    sqlx::query(
        "INSERT INTO users (id, email, full_name, status, created_at, updated_at)
         VALUES (?1, 'cashier@example.com', 'Default Cashier', 'active', datetime('now'), datetime('now'))",
    )
    .bind(USER_ID)
    .execute(db.pool())
    .await?;

    for (id, name, phone) in [
        ("cust-walkin", "Walk-in Customer", None::<&str>),
        ("cust-regular", "Jordan Regular", Some("555-0101")),
        ("cust-wholesale", "Acme Wholesale", Some("555-0102")),
    ] {
        sqlx::query(
            "INSERT INTO customers (id, name, phone, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, 'active', datetime('now'), datetime('now'))",
        )
        .bind(id)
        .bind(name)
        .bind(phone)
        .execute(db.pool())
        .await?;
    }

    Ok(())
}

/// Generates a single inventory item with deterministic pseudo-random data.
fn generate_item(
    category: &str,
    name: &str,
    size: &str,
    price_addon: i64,
    seed: usize,
) -> InventoryItem {
    let now = Utc::now();

    let code = format!(
        "{}-{}-{:04}",
        category,
        name.replace(' ', "")
            .chars()
            .take(4)
            .collect::<String>()
            .to_uppercase(),
        seed
    );

    // Price: base $0.99-$8.99 + size addon
    let base_price = 99 + ((seed * 17) % 800) as i64;
    let price_cents = base_price + price_addon;

    let tax_rate_bps = TAX_RATES[seed % TAX_RATES.len()];
    let stock = (seed % 101) as i64;

    InventoryItem {
        id: Uuid::new_v4().to_string(),
        store_id: STORE_ID.to_string(),
        name: format!("{} {}", name, size),
        code,
        unit: "pcs".to_string(),
        price_cents,
        tax_rate_bps,
        stock,
        min_stock: 10,
        status: ItemStatus::Active,
        created_at: now,
        updated_at: now,
    }
}
