//! # Seed Data Generator
//!
//! Populates a development database with an admin user, a staff user, and
//! sample devices.
//!
//! ## Usage
//! ```bash
//! # Defaults: ./cellstock_dev.db, 40 devices, admin password "change-me-now"
//! cargo run -p cellstock-db --bin seed
//!
//! # Custom amount and path
//! cargo run -p cellstock-db --bin seed -- --count 100 --db ./data/cellstock.db
//!
//! # Set the admin password
//! cargo run -p cellstock-db --bin seed -- --admin-password "s3cret-pass"
//! ```

use std::env;

use cellstock_core::Role;
use cellstock_db::{Database, DbConfig, NewDevice, NewUser};

/// Brand/model pairs with a base purchase price in cents.
const CATALOG: &[(&str, &str, i64)] = &[
    ("Apple", "iPhone 13", 42000),
    ("Apple", "iPhone 14", 55000),
    ("Apple", "iPhone 14 Pro", 72000),
    ("Samsung", "Galaxy S23", 50000),
    ("Samsung", "Galaxy A54", 28000),
    ("Samsung", "Galaxy Z Flip5", 65000),
    ("Google", "Pixel 7a", 32000),
    ("Google", "Pixel 8", 45000),
    ("Xiaomi", "Redmi Note 12", 15000),
    ("Xiaomi", "13T", 38000),
    ("OnePlus", "Nord 3", 26000),
    ("Motorola", "Edge 40", 30000),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 40;
    let mut db_path = String::from("./cellstock_dev.db");
    let mut admin_password = String::from("change-me-now");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(40);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--admin-password" | "-p" => {
                if i + 1 < args.len() {
                    admin_password = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Cellstock Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>            Number of devices to generate (default: 40)");
                println!("  -d, --db <PATH>            Database file path (default: ./cellstock_dev.db)");
                println!("  -p, --admin-password <PW>  Admin password (default: change-me-now)");
                println!("  -h, --help                 Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Cellstock Seed Data Generator");
    println!("=============================");
    println!("Database: {}", db_path);
    println!("Devices:  {}", count);
    println!();

    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.devices().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} devices", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Users
    let admin = db
        .users()
        .create(NewUser {
            username: "admin".to_string(),
            email: "admin@cellstock.local".to_string(),
            password: admin_password,
            role: Role::Admin,
        })
        .await?;
    println!("✓ Created admin user ({})", admin.username);

    let staff = db
        .users()
        .create(NewUser {
            username: "counter1".to_string(),
            email: "counter1@cellstock.local".to_string(),
            password: "counter1-pass".to_string(),
            role: Role::Staff,
        })
        .await?;
    println!("✓ Created staff user ({})", staff.username);

    // Devices
    println!();
    println!("Generating devices...");

    let start = std::time::Instant::now();
    let mut generated = 0;

    for idx in 0..count {
        let (brand, model, base_price) = CATALOG[idx % CATALOG.len()];
        let device = NewDevice {
            // Deterministic 15-digit IMEIs in a reserved-looking range
            imei: format!("{:015}", 350_000_000_000_000u64 + idx as u64),
            brand: brand.to_string(),
            model: model.to_string(),
            // Spread prices a little so reports have texture
            purchase_price_cents: base_price + ((idx as i64 * 137) % 3000),
            notes: None,
        };

        if let Err(e) = db.devices().register(device).await {
            eprintln!("Failed to register device {}: {}", idx, e);
            continue;
        }

        generated += 1;
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Registered {} devices in {:?}", generated, elapsed);

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
