use clap::Parser;
use std::path::PathBuf;

/// All interaction happens through the menus; the flags only override where
/// the tool looks for its credential file, browser binary, and login page.
#[derive(Parser, Debug)]
#[command(
    name = "gstlogin",
    about = "Menu-driven GST portal login assistant.",
    version
)]
pub struct Cli {
    /// Path to the credential file (default: gst_accounts.env).
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Path to the Chrome/Chromium binary driving the login session.
    #[arg(long)]
    pub browser: Option<PathBuf>,

    /// Login page URL.
    #[arg(long)]
    pub url: Option<String>,
}
