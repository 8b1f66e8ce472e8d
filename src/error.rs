use std::path::PathBuf;

use thiserror::Error;

use crate::session::SessionError;

#[derive(Debug, Error)]
pub enum GstLoginError {
    #[error(
        "Browser binary not found at {}. Set 'browser' in gstlogin.toml, GSTLOGIN_BROWSER, or --browser.",
        .0.display()
    )]
    BrowserMissing(PathBuf),

    #[error("Trade Name '{0}' not found. Choose one of the listed accounts.")]
    AccountNotFound(String),

    #[error(
        "Credentials for '{trade_name}' (index {index}) are incomplete. \
         Expected variables: {username_key} and {password_key}."
    )]
    IncompleteCredentials {
        trade_name: String,
        index: u32,
        username_key: String,
        password_key: String,
    },

    #[error("Trade Name cannot be empty.")]
    EmptyTradeName,

    #[error("Config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Session(#[from] SessionError),
}
