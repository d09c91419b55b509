//! # Seed Data Generator
//!
//! Populates the database with a shop catalog and sample invoices for
//! development.
//!
//! ## Usage
//! ```bash
//! # Catalog + 10 invoices (default)
//! cargo run -p wrench-db --bin seed
//!
//! # More invoices
//! cargo run -p wrench-db --bin seed -- --invoices 200
//!
//! # Specify database path
//! cargo run -p wrench-db --bin seed -- --db ./data/wrench.db
//! ```
//!
//! ## Generated Data
//! - Catalog: parts in several sizes/grades plus labour and service items,
//!   each with a price and starting stock
//! - Customers: a fixed roster, created through invoice entry
//! - Invoices: 1-4 lines each, created through `InvoiceService` so numbers,
//!   totals, and stock all go through the real lifecycle

use std::env;

use wrench_core::{CustomerDetails, LineItem, Money, NewInvoice, NewItem, PaymentStatus};
use wrench_db::{Database, DbConfig};

/// Part families and their base price in cents.
const PARTS: &[(&str, i64)] = &[
    ("Brake Pads", 4500),
    ("Brake Rotor", 7900),
    ("Oil Filter", 1200),
    ("Air Filter", 1800),
    ("Cabin Filter", 2200),
    ("Spark Plug", 900),
    ("Wiper Blade", 1500),
    ("Serpentine Belt", 3400),
    ("Battery", 14900),
    ("Headlight Bulb", 1900),
];

/// Grade variants and their price addon in cents.
const GRADES: &[(&str, i64)] = &[("Economy", 0), ("Standard", 800), ("Premium", 2500)];

/// Non-stocked service items (quantity stays at 0 and may go negative).
const SERVICES: &[(&str, i64)] = &[
    ("Labour (hour)", 9500),
    ("Diagnostic", 12000),
    ("Oil Change Service", 4900),
    ("Wheel Alignment", 8900),
    ("Tire Rotation", 3500),
];

const CUSTOMERS: &[(&str, &str)] = &[
    ("Dana Reyes", "555-0101"),
    ("Sam Ortiz", "555-0102"),
    ("Priya Natarajan", "555-0103"),
    ("Lee Kowalski", "555-0104"),
    ("Morgan Blake", "555-0105"),
];

const VEHICLES: &[(&str, &str)] = &[
    ("1HGCM82633A004352", "2012 Honda Civic"),
    ("2T1BURHE0JC123456", "2018 Toyota Corolla"),
    ("1FTFW1ET5DFC10312", "2013 Ford F-150"),
    ("WVWZZZ1JZXW000001", "2009 VW Golf"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut invoices: usize = 10;
    let mut db_path = String::from("./wrench_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--invoices" | "-n" => {
                if i + 1 < args.len() {
                    invoices = args[i + 1].parse().unwrap_or(10);
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
                println!("Wrench POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -n, --invoices <N> Number of sample invoices (default: 10)");
                println!("  -d, --db <PATH>    Database file path (default: ./wrench_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Wrench POS Seed Data Generator");
    println!("==============================");
    println!("Database: {}", db_path);
    println!("Invoices: {}", invoices);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    if !db.items().list(1).await?.is_empty() {
        println!("⚠ Database already has catalog items");
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Catalog
    let catalog = catalog_items();
    let mut stocked = Vec::with_capacity(catalog.len());
    for item in &catalog {
        match db.items().insert(item).await {
            Ok(created) => stocked.push(created),
            Err(e) => eprintln!("Failed to insert {}: {}", item.name, e),
        }
    }
    println!("✓ Inserted {} catalog items", stocked.len());

    // Invoices
    let settings = db.settings().get_or_init().await?;
    let service = db.invoice_service();
    let start = std::time::Instant::now();

    let mut created = 0;
    for seed in 0..invoices {
        let request = sample_invoice(seed, &stocked);
        match service.create(request, &settings).await {
            Ok(invoice) => {
                created += 1;
                if created % 50 == 0 {
                    println!("  Created {} invoices...", created);
                }
                if seed == 0 {
                    println!(
                        "  First invoice: {} ({})",
                        invoice.invoice_number, invoice.totals.grand_total
                    );
                }
            }
            Err(e) => eprintln!("Failed to create invoice {}: {}", seed, e),
        }
    }

    println!("✓ Created {} invoices in {:?}", created, start.elapsed());
    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Parts in every grade plus the service items.
fn catalog_items() -> Vec<NewItem> {
    let mut items = Vec::new();

    for (part_idx, (part, base)) in PARTS.iter().enumerate() {
        for (grade_idx, (grade, addon)) in GRADES.iter().enumerate() {
            items.push(NewItem {
                name: format!("{} ({})", part, grade),
                price: Money::from_cents(base + addon),
                quantity: ((part_idx * 7 + grade_idx * 3) % 25 + 5) as i64,
            });
        }
    }

    for (service, price) in SERVICES {
        items.push(NewItem {
            name: service.to_string(),
            price: Money::from_cents(*price),
            quantity: 0,
        });
    }

    items
}

/// Deterministic pseudo-random invoice built from `seed`.
fn sample_invoice(seed: usize, catalog: &[wrench_core::Item]) -> NewInvoice {
    let (name, phone) = CUSTOMERS[seed % CUSTOMERS.len()];
    let (vin, vehicle) = VEHICLES[(seed / 2) % VEHICLES.len()];

    let line_count = 1 + seed % 4;
    let items = (0..line_count)
        .filter_map(|n| catalog.get((seed * 13 + n * 7) % catalog.len().max(1)))
        .enumerate()
        .map(|(n, item)| {
            LineItem::new(item.name.clone(), (1 + (seed + n) % 3) as i64, item.price)
                .with_item_id(item.id.clone())
        })
        .collect();

    NewInvoice {
        vin: Some(vin.to_string()),
        year_model: Some(vehicle.to_string()),
        customer: CustomerDetails {
            name: name.to_string(),
            phone: phone.to_string(),
            address: None,
        },
        items,
        discount: Some([0.0, 5.0, 10.0][seed % 3]),
        tax: Some([0.0, 8.25][seed % 2]),
        deposit: (seed % 5 == 0).then(|| Money::from_cents(2000)),
        refund_amount: None,
        refund_reason: None,
        notes: (seed % 4 == 0).then(|| "Customer supplied own oil.".to_string()),
        payment_status: Some(if seed % 3 == 0 {
            PaymentStatus::Unpaid
        } else {
            PaymentStatus::Paid
        }),
        payment_method: None,
    }
}
