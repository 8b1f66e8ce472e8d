use anyhow::{Context, Result};

use crate::config::Config;
use crate::store::CredentialStore;

pub fn run(config: &Config) -> Result<()> {
    println!("\n--- List All Accounts ---");

    let store =
        CredentialStore::open(&config.store_path).context("Failed to open credential store")?;
    let records = store.records().context("Failed to read credential store")?;

    if records.is_empty() {
        println!(
            "No accounts found following the naming convention \
             (Trade_Name_X, GST_UserID_X, GST_PSSWD_X)."
        );
        return Ok(());
    }

    for record in &records {
        println!("Trade Name: {} (Index: {})", record.trade_name, record.index);
        println!(
            "  Username: {}",
            record.username.as_deref().unwrap_or("N/A")
        );
        // Password material stays masked; only its presence is shown.
        println!(
            "  Password: {}",
            if record.password.is_some() { "***" } else { "Not set" }
        );
        if !record.is_complete() {
            println!("  (incomplete: not usable for login until both fields are set)");
        }
        println!("{}", "-".repeat(20));
    }

    Ok(())
}
