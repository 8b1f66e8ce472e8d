use anyhow::Result;

use crate::commands;
use crate::config::Config;
use crate::prompt::Prompter;

/// Top-level loop. The process only leaves it on explicit operator exit (or
/// a closed stdin); every command error short of that is reported and the
/// menu comes back.
pub fn main_menu(config: &Config, prompter: &mut dyn Prompter) -> Result<()> {
    loop {
        println!();
        println!("Main Menu:");
        println!("1. Manage Credentials (Add/Update/List)");
        println!("2. Perform GST Login");
        println!("3. Exit");

        let choice = prompter.read_line("Enter your choice (1-3): ")?;
        match choice.as_str() {
            "1" => report(credentials_menu(config, prompter))?,
            "2" => report(commands::login::run(config, prompter))?,
            "3" => {
                println!("Exiting GST Automation Tool. Goodbye!");
                return Ok(());
            }
            _ => println!("Invalid choice. Please enter a number between 1 and 3."),
        }
    }
}

fn credentials_menu(config: &Config, prompter: &mut dyn Prompter) -> Result<()> {
    loop {
        println!();
        println!("--- Credential Management Menu ---");
        println!("1. Add a NEW account");
        println!("2. Update an EXISTING account");
        println!("3. List all accounts");
        println!("4. Go back to Main Menu");

        let choice = prompter.read_line("Enter your choice (1-4): ")?;
        match choice.as_str() {
            "1" => report(commands::add::run(config, prompter))?,
            "2" => report(commands::update::run(config, prompter))?,
            "3" => report(commands::list::run(config))?,
            "4" => return Ok(()),
            _ => println!("Invalid choice. Please enter a number between 1 and 4."),
        }
    }
}

/// Keeps the menu loop available on command failures. Only a closed stdin
/// propagates, since without operator input there is no menu to return to.
fn report(result: Result<()>) -> Result<()> {
    match result {
        Err(err) if !is_eof(&err) => {
            println!("Error: {err:#}");
            Ok(())
        }
        other => other,
    }
}

fn is_eof(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<std::io::Error>()
            .is_some_and(|io| io.kind() == std::io::ErrorKind::UnexpectedEof)
    })
}
