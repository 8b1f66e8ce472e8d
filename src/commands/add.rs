use anyhow::{Context, Result};

use crate::config::Config;
use crate::error::GstLoginError;
use crate::prompt::Prompter;
use crate::store::{AccountUpdate, CredentialStore, UpsertOutcome};

pub fn run(config: &Config, prompter: &mut dyn Prompter) -> Result<()> {
    println!("\n--- Add New Account ---");

    let store =
        CredentialStore::open(&config.store_path).context("Failed to open credential store")?;

    let trade_name = prompter.read_line("Enter a NEW unique Trade Name for the account: ")?;
    if trade_name.is_empty() {
        println!("Trade Name cannot be empty. Aborting.");
        return Ok(());
    }

    let username = prompter.read_line(&format!("Enter the username for '{trade_name}': "))?;
    let password = prompter.read_password(&format!("Enter the password for '{trade_name}': "))?;
    if username.is_empty() || password.is_empty() {
        println!("Username and password cannot be empty. Aborting.");
        return Ok(());
    }

    let update = AccountUpdate {
        trade_name: trade_name.clone(),
        username: Some(username),
        password: Some(password),
    };
    let outcome = store
        .upsert(update, &mut |question| {
            prompter.confirm(question).map_err(GstLoginError::Io)
        })
        .context("Failed to update credential store")?;

    match outcome {
        UpsertOutcome::Inserted(index) => {
            println!("Account '{trade_name}' added with index {index}.");
        }
        UpsertOutcome::Updated(index) => {
            println!("Account '{trade_name}' overwritten at index {index}.");
        }
        UpsertOutcome::Aborted => println!("Aborting add operation."),
    }

    Ok(())
}
