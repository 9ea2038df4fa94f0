//! # Seed Data Generator
//!
//! Populates the database with a catalog and a month of sales for
//! local dashboard development.
//!
//! ## Usage
//! ```bash
//! # Seed ./data/salon.db with 30 days of sales (default)
//! cargo run -p salon-db --bin seed
//!
//! # Custom number of days
//! cargo run -p salon-db --bin seed -- --days 60
//!
//! # Specify database path
//! cargo run -p salon-db --bin seed -- --db ./data/dev.db
//! ```
//!
//! ## Generated Data
//! - Both channels, each with its own category set
//! - Several products per category, some tagged with two categories
//! - 3-8 sales per day, 1-3 lines each, quantities 1-4
//!
//! Values are derived from the loop indexes, so every run produces the
//! same catalog and sales mix.

use chrono::{Duration, Utc};
use std::env;

use salon_core::{Channel, Money, NewProduct, NewSale, NewSaleLine, Product, ProductFilter};
use salon_db::{Database, DbConfig};

/// (channel, category, [(product name, price cents, extra category)])
type CatalogEntry = (Channel, &'static str, &'static [(&'static str, i64, Option<&'static str>)]);

const CATALOG: &[CatalogEntry] = &[
    (
        Channel::HairCare,
        "Shampoo",
        &[
            ("Argan Oil Shampoo", 1899, None),
            ("Sulfate-Free Shampoo", 1599, None),
            ("Anti-Dandruff Shampoo", 1299, Some("Treatments")),
        ],
    ),
    (
        Channel::HairCare,
        "Conditioner",
        &[
            ("Hydrating Conditioner", 1699, None),
            ("Leave-In Conditioner", 1450, Some("Styling")),
        ],
    ),
    (
        Channel::HairCare,
        "Treatments",
        &[("Keratin Mask", 3200, None), ("Scalp Serum", 2750, None)],
    ),
    (
        Channel::HairCare,
        "Styling",
        &[("Texturizing Spray", 1399, None), ("Strong Hold Gel", 899, None)],
    ),
    (
        Channel::Cosmetic,
        "Face",
        &[
            ("Liquid Foundation", 2999, None),
            ("Setting Powder", 2199, None),
            ("Cream Blush", 1799, Some("Lips")),
        ],
    ),
    (
        Channel::Cosmetic,
        "Eyes",
        &[("Volume Mascara", 1599, None), ("Eyeliner Pen", 1199, None)],
    ),
    (
        Channel::Cosmetic,
        "Lips",
        &[("Matte Lipstick", 1499, None), ("Lip Gloss", 999, None)],
    ),
];

const USERS: &[&str] = &["stylist-ana", "stylist-ben", "front-desk"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut days: i64 = 30;
    let mut db_path = String::from("./data/salon.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--days" | "-n" => {
                if i + 1 < args.len() {
                    days = args[i + 1].parse().unwrap_or(30);
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
                println!("Salon Stock Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -n, --days <N>     Days of sales to generate (default: 30)");
                println!("  -d, --db <PATH>    Database file path (default: ./data/salon.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Salon Stock Seed Data Generator");
    println!("==================================");
    println!("Database: {}", db_path);
    println!("Days:     {}", days);
    println!();

    if let Some(parent) = std::path::Path::new(&db_path).parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db = Database::new(DbConfig::new(&db_path)).await?;

    let (total, applied) = salon_db::migrations::migration_status(db.pool()).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied ({}/{})", applied, total);

    let existing = db.products().list(&ProductFilter::default()).await?;
    if !existing.is_empty() {
        println!("⚠ Database already has {} products", existing.len());
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // -------------------------------------------------------------------------
    // Catalog
    // -------------------------------------------------------------------------
    println!();
    println!("Creating catalog...");

    let mut inputs = Vec::new();
    for (idx, (channel, category, products)) in CATALOG.iter().enumerate() {
        for (product_idx, (name, price_cents, extra)) in products.iter().enumerate() {
            let mut categories = vec![category.to_string()];
            if let Some(extra) = extra {
                categories.push(extra.to_string());
            }
            let seed = idx * 10 + product_idx;
            inputs.push(NewProduct {
                name: name.to_string(),
                price: Money::from_cents(*price_cents),
                stock: 40 + (seed as i64 * 7) % 60,
                min_stock: 10,
                max_stock: 120,
                channel: *channel,
                categories,
            });
        }
    }

    let products = db.products().create_many(&inputs).await?;
    println!("✓ Created {} products", products.len());

    // -------------------------------------------------------------------------
    // Sales
    // -------------------------------------------------------------------------
    println!();
    println!("Generating sales...");

    let start = std::time::Instant::now();
    let by_channel: Vec<Vec<&Product>> = Channel::ALL
        .iter()
        .map(|c| products.iter().filter(|p| p.channel == *c).collect())
        .collect();

    let today = Utc::now();
    let mut sales = Vec::new();
    for day in 0..days {
        let per_day = 3 + (day * 5) % 6;
        for n in 0..per_day {
            let seed = (day * 31 + n * 7) as usize;
            let pool = &by_channel[seed % by_channel.len()];
            if pool.is_empty() {
                continue;
            }

            let line_count = 1 + seed % 3;
            let lines = (0..line_count)
                .map(|l| NewSaleLine {
                    product_id: pool[(seed + l * 3) % pool.len()].id.clone(),
                    quantity: 1 + ((seed + l) % 4) as i64,
                })
                .collect();

            sales.push(NewSale {
                user_id: USERS[seed % USERS.len()].to_string(),
                created_at: Some(today - Duration::days(day) - Duration::minutes(n * 47)),
                products: lines,
            });
        }
    }

    let created = db.sales().create_many(&sales).await?;
    let revenue: Money = created.iter().map(|s| s.total()).sum();

    println!(
        "✓ Generated {} sales in {:?} (revenue {})",
        created.len(),
        start.elapsed(),
        revenue
    );

    let low = db
        .products()
        .list(&ProductFilter { channel: None, low_stock: true })
        .await?;
    println!("  Low-stock products: {}", low.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
