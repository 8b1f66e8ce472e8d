use anyhow::{Context, Result};
use secrecy::SecretString;

use crate::config::Config;
use crate::error::GstLoginError;
use crate::login::{Credentials, LoginMachine, LoginOutcome};
use crate::prompt::Prompter;
use crate::session::chrome::ChromeSession;
use crate::store::line::Field;
use crate::store::CredentialStore;

pub fn run(config: &Config, prompter: &mut dyn Prompter) -> Result<()> {
    println!("\n--- Perform GST Login ---");

    // Preflight: a configured browser binary that is not there fails the
    // login feature before any state machine runs.
    if let Some(path) = &config.browser {
        if !path.exists() {
            println!("Error: {}", GstLoginError::BrowserMissing(path.clone()));
            return Ok(());
        }
    }

    let store =
        CredentialStore::open(&config.store_path).context("Failed to open credential store")?;
    if store.records()?.is_empty() {
        println!(
            "No accounts found in {}. Please add an account using 'Manage Credentials' first.",
            config.store_path.display()
        );
        return Ok(());
    }
    print_accounts(&store)?;

    loop {
        let input = prompter.read_line(
            "\nEnter the Trade Name of the account to log in with ('list' for options, 'back' for the main menu): ",
        )?;
        if input.eq_ignore_ascii_case("back") {
            println!("Returning to main menu.");
            return Ok(());
        }
        if input.eq_ignore_ascii_case("list") {
            print_accounts(&store)?;
            continue;
        }

        let Some(index) = store.resolve(&input)? else {
            println!("{}", GstLoginError::AccountNotFound(input));
            continue;
        };
        let trade_name = store.read(index, Field::TradeName)?.unwrap_or(input);

        let username = store.read(index, Field::Username)?;
        let password = store.read(index, Field::Password)?;
        let (Some(username), Some(password)) = (username, password) else {
            println!(
                "{}",
                GstLoginError::IncompleteCredentials {
                    trade_name,
                    index,
                    username_key: Field::Username.key(index),
                    password_key: Field::Password.key(index),
                }
            );
            println!("Add or update this account via 'Manage Credentials'.");
            continue;
        };

        println!("Attempting to log in with account: {trade_name}");
        let session = match ChromeSession::launch(config.browser.as_deref()) {
            Ok(session) => session,
            Err(err) => {
                println!("Could not start the browser session: {err}");
                continue;
            }
        };

        let credentials = Credentials {
            trade_name: trade_name.clone(),
            username,
            password: SecretString::new(password),
        };
        match LoginMachine::new(session).attempt(&credentials, &config.url, prompter) {
            LoginOutcome::Success => {
                println!("Successfully logged in with account: {trade_name}");
                return Ok(());
            }
            LoginOutcome::Failure { message } => {
                if let Some(message) = message {
                    println!("Error message: {message}");
                }
                println!(
                    "Login failed for account: {trade_name}. Check the credentials, \
                     the CAPTCHA, or the portal's status and try again."
                );
            }
        }
    }
}

fn print_accounts(store: &CredentialStore) -> Result<()> {
    println!("\nAvailable accounts (Trade Names):");
    for record in store.records()? {
        println!("- {}", record.trade_name);
    }
    Ok(())
}
