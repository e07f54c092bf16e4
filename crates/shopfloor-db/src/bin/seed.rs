//! # Seed Data Generator
//!
//! Populates a database with shops, brands, categories and stocked
//! products for development.
//!
//! ## Usage
//! ```bash
//! # 200 products (default)
//! cargo run -p shopfloor-db --bin seed
//!
//! # Custom amount and database
//! cargo run -p shopfloor-db --bin seed -- --count 1000 --db ./data/shopfloor.db
//! ```
//!
//! Products are spread round-robin over the shops, brands and categories
//! below. Dimensions and stock are derived from the product index, so the
//! same `--count` always yields the same catalog shape.

use std::env;

use shopfloor_core::NewProduct;
use shopfloor_db::{Database, DbConfig};

const SHOPS: &[&str] = &["Main Street", "Harbour Depot", "North Yard"];

const BRANDS: &[&str] = &["Acme Timber", "Northwood", "Stonecraft", "Ironline"];

/// Category name and the product names sold under it.
const CATEGORIES: &[(&str, &[&str])] = &[
    ("Boards", &["Oak plank", "Pine plank", "Birch plywood", "MDF sheet", "Cedar board"]),
    ("Tiles", &["Ceramic floor tile", "Porcelain wall tile", "Slate tile", "Mosaic sheet"]),
    ("Steel", &["Rebar", "Flat bar", "Angle iron", "Square tube", "Round tube"]),
    ("Glass", &["Float glass", "Tempered pane", "Frosted pane"]),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut db_path = String::from("./shopfloor_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(200);
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
                println!("Shopfloor Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: ./shopfloor_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Shopfloor Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let catalog = db.catalog();

    let existing = catalog.count_products().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let mut shops = Vec::new();
    for name in SHOPS {
        shops.push(catalog.insert_shop(name).await?);
    }
    let mut brands = Vec::new();
    for name in BRANDS {
        brands.push(catalog.insert_brand(name).await?);
    }
    let mut categories = Vec::new();
    for (name, _) in CATEGORIES {
        categories.push(catalog.insert_category(name).await?);
    }
    println!(
        "✓ {} shops, {} brands, {} categories",
        shops.len(),
        brands.len(),
        categories.len()
    );

    println!();
    println!("Generating products...");
    let start = std::time::Instant::now();
    let mut generated = 0;

    for seed in 0..count {
        let category_idx = seed % CATEGORIES.len();
        let (_, names) = CATEGORIES[category_idx];
        let base_name = names[(seed / CATEGORIES.len()) % names.len()];

        let product = generate_product(
            base_name,
            seed,
            &brands[seed % brands.len()].id,
            &shops[seed % shops.len()].id,
            &categories[category_idx].id,
        );

        if let Err(e) = catalog.insert_product(&product).await {
            eprintln!("Failed to insert {}: {}", product.name, e);
            continue;
        }

        generated += 1;
        if generated % 100 == 0 {
            println!("  Generated {} products...", generated);
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} products in {:?}", generated, elapsed);
    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Builds one product with dimensions and stock derived from `seed`.
fn generate_product(base_name: &str, seed: usize, brand_id: &str, shop_id: &str, category_id: &str) -> NewProduct {
    // Length 60-300, width 10-120 (cm)
    let length = 60.0 + ((seed * 37) % 241) as f64;
    let width = 10.0 + ((seed * 13) % 111) as f64;

    // Roughly a third of products carry no thickness / weight
    let thickness = (seed % 3 != 0).then(|| 0.5 + ((seed * 7) % 40) as f64 / 10.0);
    let weight = (seed % 3 != 1).then(|| 0.2 + ((seed * 11) % 500) as f64 / 10.0);

    // Stock 0-150
    let quantity = ((seed * 29) % 151) as i64;

    NewProduct {
        name: format!("{} {}x{}", base_name, length as i64, width as i64),
        length,
        width,
        thickness,
        weight,
        quantity,
        brand_id: brand_id.to_string(),
        shop_id: shop_id.to_string(),
        category_id: category_id.to_string(),
    }
}
