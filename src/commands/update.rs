use anyhow::{Context, Result};

use crate::config::Config;
use crate::error::GstLoginError;
use crate::prompt::Prompter;
use crate::store::line::Field;
use crate::store::{AccountUpdate, CredentialStore};

pub fn run(config: &Config, prompter: &mut dyn Prompter) -> Result<()> {
    println!("\n--- Update Existing Account ---");

    let store =
        CredentialStore::open(&config.store_path).context("Failed to open credential store")?;
    let records = store.records().context("Failed to read credential store")?;
    if records.is_empty() {
        println!("No accounts found to update. Please add a new account first.");
        return Ok(());
    }

    println!("\nExisting accounts (Trade Names):");
    for record in &records {
        println!("- {}", record.trade_name);
    }

    loop {
        let input =
            prompter.read_line("Enter the Trade Name of the account to update ('back' to cancel): ")?;
        if input.eq_ignore_ascii_case("back") {
            return Ok(());
        }

        let Some(index) = store.resolve(&input)? else {
            println!("{}", GstLoginError::AccountNotFound(input));
            continue;
        };
        // Pass the stored casing back through the upsert so an update never
        // re-titles the account.
        let trade_name = store.read(index, Field::TradeName)?.unwrap_or(input);

        println!("\nUpdating credentials for '{trade_name}' (index {index})");
        let current_username = store.read(index, Field::Username)?;
        println!(
            "(Current username: {})",
            current_username.as_deref().unwrap_or("Not set")
        );
        let has_password = store.read(index, Field::Password)?.is_some();
        println!(
            "(Current password: {})",
            if has_password { "***" } else { "Not set" }
        );

        let new_username = prompter.read_line("Enter NEW username (leave blank to keep current): ")?;
        let new_password =
            prompter.read_password("Enter NEW password (leave blank to keep current): ")?;
        if new_username.is_empty() && new_password.is_empty() {
            println!("No changes made.");
            return Ok(());
        }

        let update = AccountUpdate {
            trade_name: trade_name.clone(),
            username: (!new_username.is_empty()).then_some(new_username),
            password: (!new_password.is_empty()).then_some(new_password),
        };
        // Selecting the account was the confirmation; the conflict prompt
        // would only re-ask the same question.
        store
            .upsert(update, &mut |_| Ok(true))
            .context("Failed to update credential store")?;

        println!("Credentials for '{trade_name}' updated successfully.");
        return Ok(());
    }
}
