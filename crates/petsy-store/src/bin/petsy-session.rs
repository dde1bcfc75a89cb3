//! # Session Store CLI
//!
//! Drives the session store from a terminal for development: rehydrates
//! from device storage, applies one action, prints the resulting snapshot.
//!
//! ## Usage
//! ```bash
//! # Show what a fresh app start would see
//! cargo run -p petsy-store --bin petsy-session -- show
//!
//! # Add a product (price in cents) to the persisted cart
//! cargo run -p petsy-store --bin petsy-session -- add p1 "Dry Food 2kg" 999
//!
//! # Use a specific database file
//! cargo run -p petsy-store --bin petsy-session -- --db ./petsy_dev.db set-qty p1 3
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info,petsy=debug,sqlx=warn`).

use std::env;
use std::path::PathBuf;

use tracing_subscriber::EnvFilter;

use petsy_core::{Locale, Money, NewCartItem, ThemeMode};
use petsy_store::{StorageBackend, StoreBuilder, StoreConfig, StoreHandle};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,petsy=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_help() {
    println!("Petsy Session Store");
    println!();
    println!("Usage: petsy-session [OPTIONS] <ACTION> [ARGS]");
    println!();
    println!("Options:");
    println!("  -c, --config <PATH>   Config file (default: platform config dir)");
    println!("  -d, --db <PATH>       SQLite database file");
    println!("  -m, --memory          Use in-memory storage");
    println!("  -h, --help            Show this help message");
    println!();
    println!("Actions:");
    println!("  show                          Print the rehydrated state (default)");
    println!("  add <ID> <NAME> <CENTS>       Add one unit of a product");
    println!("  set-qty <ID> <QTY>            Set a line quantity (0 removes it)");
    println!("  remove <ID>                   Remove a line");
    println!("  clear                         Empty the cart");
    println!("  token <TOKEN>                 Store an auth token");
    println!("  language <en|ar>              Set the display language");
    println!("  theme <light|dark|system>     Set the theme mode");
    println!("  logout                        Sign out and drop the cart");
}

fn arg(action: &[String], n: usize) -> Result<&str, Box<dyn std::error::Error>> {
    action
        .get(n)
        .map(String::as_str)
        .ok_or_else(|| format!("missing argument {} for '{}'", n, action[0]).into())
}

async fn run_action(store: &StoreHandle, action: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    match action.first().map(String::as_str).unwrap_or("show") {
        "show" => {}
        "add" => {
            let price: i64 = arg(action, 3)?.parse()?;
            let quantity = store
                .add_to_cart(NewCartItem::new(arg(action, 1)?, arg(action, 2)?, Money::from_cents(price)))
                .await?;
            eprintln!("✓ {} now x{}", arg(action, 1)?, quantity);
        }
        "set-qty" => {
            let quantity: i64 = arg(action, 2)?.parse()?;
            store.update_cart_quantity(arg(action, 1)?, quantity).await?;
        }
        "remove" => store.remove_from_cart(arg(action, 1)?).await?,
        "clear" => store.clear_cart().await?,
        "token" => store.set_token(Some(arg(action, 1)?.to_string())).await?,
        "language" => store.set_language(arg(action, 1)?.parse::<Locale>()?).await?,
        "theme" => store.set_theme_mode(arg(action, 1)?.parse::<ThemeMode>()?).await?,
        "logout" => store.logout().await?,
        other => return Err(format!("unknown action '{}', see --help", other).into()),
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut config_path: Option<PathBuf> = None;
    let mut db_path: Option<PathBuf> = None;
    let mut in_memory = false;
    let mut action: Vec<String> = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--memory" | "-m" => in_memory = true,
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            _ => action.push(args[i].clone()),
        }
        i += 1;
    }

    init_tracing();

    let mut config = StoreConfig::load(config_path)?;
    if let Some(path) = db_path {
        config.storage.backend = StorageBackend::Sqlite;
        config.storage.path = Some(path);
    }
    if in_memory {
        config.storage.backend = StorageBackend::Memory;
    }

    let store = StoreBuilder::from_config(&config).await?.spawn()?;
    store.load_stored_auth().await?;

    let outcome = run_action(&store, &action).await;

    let snapshot = store.snapshot();
    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    store.shutdown().await;
    outcome
}
