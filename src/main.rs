mod cli;
mod commands;
mod config;
mod error;
mod login;
mod menu;
mod prompt;
mod session;
mod store;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::Cli;
use prompt::StdinPrompter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Diagnostics go to stderr; stdout belongs to the menus.
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = config::load(&cli)?;

    println!("--- Welcome to GST Automation Tool ---");
    let mut prompter = StdinPrompter;
    menu::main_menu(&config, &mut prompter)
}
