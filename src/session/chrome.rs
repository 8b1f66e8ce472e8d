use std::path::Path;
use std::time::{Duration, Instant};

use chromiumoxide::{Browser, BrowserConfig, Page};
use futures_util::StreamExt;
use tokio::runtime::Runtime;
use tracing::{debug, info, warn};

use super::{Result, Session, SessionError};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// A `Session` over Chrome DevTools. Owns a private tokio runtime and blocks
/// on it for every call, so callers stay fully synchronous. The browser
/// always launches headed — the operator has to read the CAPTCHA from the
/// live window.
pub struct ChromeSession {
    runtime: Runtime,
    browser: Option<Browser>,
    page: Page,
    handler_task: tokio::task::JoinHandle<()>,
}

impl ChromeSession {
    pub fn launch(executable: Option<&Path>) -> Result<Self> {
        let runtime = Runtime::new().map_err(|e| SessionError::Driver(e.to_string()))?;

        let (browser, mut handler) = runtime.block_on(async {
            let mut builder = BrowserConfig::builder().with_head().window_size(1280, 900);
            if let Some(path) = executable {
                builder = builder.chrome_executable(path);
            }
            let config = builder.build().map_err(SessionError::Driver)?;

            info!(executable = ?executable, "launching chrome");
            Browser::launch(config)
                .await
                .map_err(|e| SessionError::Driver(e.to_string()))
        })?;

        // The CDP WebSocket handler must be polled for the browser to work.
        let handler_task =
            runtime.spawn(async move { while handler.next().await.is_some() {} });

        let page = runtime
            .block_on(browser.new_page("about:blank"))
            .map_err(|e| SessionError::Driver(e.to_string()))?;

        Ok(Self {
            runtime,
            browser: Some(browser),
            page,
            handler_task,
        })
    }
}

impl Session for ChromeSession {
    fn navigate(&mut self, url: &str) -> Result<()> {
        debug!(url, "navigating");
        self.runtime.block_on(async {
            let page = self
                .page
                .goto(url)
                .await
                .map_err(|e| SessionError::Driver(e.to_string()))?;
            page.wait_for_navigation()
                .await
                .map_err(|e| SessionError::Driver(e.to_string()))?;
            Ok(())
        })
    }

    fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if self
                .runtime
                .block_on(self.page.find_element(selector))
                .is_ok()
            {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(SessionError::Timeout {
                    selector: selector.to_string(),
                    timeout,
                });
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }

    fn send_keys(&mut self, selector: &str, text: &str) -> Result<()> {
        self.runtime.block_on(async {
            let element = self
                .page
                .find_element(selector)
                .await
                .map_err(|_| SessionError::NotFound(selector.to_string()))?;
            // Click first so the keystrokes land in a focused element.
            element
                .click()
                .await
                .map_err(|e| SessionError::Driver(e.to_string()))?;
            element
                .type_str(text)
                .await
                .map_err(|e| SessionError::Driver(e.to_string()))?;
            Ok(())
        })
    }

    fn click(&mut self, selector: &str) -> Result<()> {
        self.runtime.block_on(async {
            let element = self
                .page
                .find_element(selector)
                .await
                .map_err(|_| SessionError::NotFound(selector.to_string()))?;
            element
                .click()
                .await
                .map_err(|e| SessionError::Driver(e.to_string()))?;
            Ok(())
        })
    }

    fn current_url(&mut self) -> Result<String> {
        self.runtime
            .block_on(self.page.url())
            .map_err(|e| SessionError::Driver(e.to_string()))?
            .ok_or_else(|| SessionError::Driver("page reported no location".to_string()))
    }

    fn read_text(&mut self, selector: &str) -> Result<Option<String>> {
        let text = self.runtime.block_on(async {
            match self.page.find_element(selector).await {
                Ok(element) => element.inner_text().await.ok().flatten(),
                Err(_) => None,
            }
        });
        Ok(text)
    }

    fn settle(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }

    fn close(&mut self) -> Result<()> {
        if let Some(mut browser) = self.browser.take() {
            self.runtime.block_on(async {
                browser
                    .close()
                    .await
                    .map_err(|e| SessionError::Driver(e.to_string()))?;
                let _ = browser.wait().await;
                Ok::<_, SessionError>(())
            })?;
            self.handler_task.abort();
            info!("browser session closed");
        }
        Ok(())
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        // Backstop for paths that never reached close().
        if let Some(mut browser) = self.browser.take() {
            warn!("browser session dropped without close; shutting chrome down");
            self.runtime.block_on(async {
                let _ = browser.close().await;
                let _ = browser.wait().await;
            });
            self.handler_task.abort();
        }
    }
}
