pub mod chrome;

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("timed out after {timeout:?} waiting for element '{selector}'")]
    Timeout { selector: String, timeout: Duration },

    #[error("element '{0}' not found")]
    NotFound(String),

    #[error("browser driver error: {0}")]
    Driver(String),
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// The opaque browser capability the login flow drives. Exactly the
/// operations the flow needs, nothing more, so a scripted implementation can
/// stand in during tests.
pub trait Session {
    fn navigate(&mut self, url: &str) -> Result<()>;

    /// Blocks until the element is present or the timeout elapses.
    fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<()>;

    fn send_keys(&mut self, selector: &str, text: &str) -> Result<()>;

    fn click(&mut self, selector: &str) -> Result<()>;

    fn current_url(&mut self) -> Result<String>;

    /// Best-effort text read; a missing element is `None`, not an error.
    fn read_text(&mut self, selector: &str) -> Result<Option<String>>;

    fn settle(&mut self, duration: Duration);

    fn close(&mut self) -> Result<()>;
}
