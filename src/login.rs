use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use crate::error::GstLoginError;
use crate::prompt::Prompter;
use crate::session::Session;

/// Post-login location markers. Any of these in the session location after
/// submit counts as a successful login.
const SUCCESS_MARKERS: [&str; 3] = ["dashboard", "home", "loggedin"];

const FORM_TIMEOUT: Duration = Duration::from_secs(10);
const CAPTCHA_TIMEOUT: Duration = Duration::from_secs(20);
const SUBMIT_TIMEOUT: Duration = Duration::from_secs(10);
const SETTLE_DELAY: Duration = Duration::from_secs(5);

/// Element locators on the GST login page.
mod selectors {
    pub const USERNAME: &str = "#username";
    pub const PASSWORD: &str = "#user_pass";
    pub const CAPTCHA: &str = "#captcha";
    pub const SUBMIT: &str = "button[type='submit']";
    pub const ERROR_BANNER: &str = ".alert-danger";
}

pub struct Credentials {
    pub trade_name: String,
    pub username: String,
    pub password: SecretString,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Navigated,
    FormFilled,
    AwaitingCaptcha,
    Submitted,
    Evaluated,
    Closed,
}

impl State {
    fn name(self) -> &'static str {
        match self {
            State::Idle => "Idle",
            State::Navigated => "Navigated",
            State::FormFilled => "FormFilled",
            State::AwaitingCaptcha => "AwaitingCaptcha",
            State::Submitted => "Submitted",
            State::Evaluated => "Evaluated",
            State::Closed => "Closed",
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum LoginOutcome {
    Success,
    Failure { message: Option<String> },
}

/// One login attempt over one browser session. The machine owns the session
/// from construction until teardown and releases it on every exit path; a
/// fresh machine is built per attempt, retrying is the operator's call.
pub struct LoginMachine<S: Session> {
    session: S,
    state: State,
}

impl<S: Session> LoginMachine<S> {
    pub fn new(session: S) -> Self {
        Self {
            session,
            state: State::Idle,
        }
    }

    /// Drives the attempt to completion. Any fault between navigation and
    /// submit is caught here, attributed to the account and the state it
    /// occurred in, and converted to a failure outcome.
    pub fn attempt(
        mut self,
        credentials: &Credentials,
        url: &str,
        prompter: &mut dyn Prompter,
    ) -> LoginOutcome {
        let outcome = match self.drive(credentials, url, prompter) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(
                    account = %credentials.trade_name,
                    state = self.state.name(),
                    "login attempt failed: {err}"
                );
                LoginOutcome::Failure {
                    message: Some(format!("{err} (state: {})", self.state.name())),
                }
            }
        };

        if matches!(outcome, LoginOutcome::Success) {
            // Teardown is deferred, never skipped: hold the session open
            // until the operator is done with it.
            let _ = prompter.read_line("Press Enter to close the browser session...");
        }
        self.close(credentials);
        outcome
    }

    fn drive(
        &mut self,
        credentials: &Credentials,
        url: &str,
        prompter: &mut dyn Prompter,
    ) -> Result<LoginOutcome, GstLoginError> {
        self.session.navigate(url)?;
        self.state = State::Navigated;
        debug!(account = %credentials.trade_name, url, "login page opened");

        self.session.wait_for(selectors::USERNAME, FORM_TIMEOUT)?;
        self.session
            .send_keys(selectors::USERNAME, &credentials.username)?;
        self.session
            .send_keys(selectors::PASSWORD, credentials.password.expose_secret())?;
        self.state = State::FormFilled;

        self.session.wait_for(selectors::CAPTCHA, CAPTCHA_TIMEOUT)?;
        self.state = State::AwaitingCaptcha;
        let solution = prompter.read_line(&format!(
            "Enter CAPTCHA from browser for '{}': ",
            credentials.trade_name
        ))?;
        self.session.send_keys(selectors::CAPTCHA, &solution)?;

        self.session.wait_for(selectors::SUBMIT, SUBMIT_TIMEOUT)?;
        self.session.click(selectors::SUBMIT)?;
        self.state = State::Submitted;

        self.session.settle(SETTLE_DELAY);
        let location = self.session.current_url()?;
        self.state = State::Evaluated;
        debug!(%location, "post-submit location");

        if SUCCESS_MARKERS.iter().any(|marker| location.contains(marker)) {
            Ok(LoginOutcome::Success)
        } else {
            // The on-page error banner is best-effort; its absence is
            // swallowed, not an error of its own.
            let message = self
                .session
                .read_text(selectors::ERROR_BANNER)
                .unwrap_or(None);
            Ok(LoginOutcome::Failure { message })
        }
    }

    fn close(&mut self, credentials: &Credentials) {
        if self.state == State::Closed {
            return;
        }
        if let Err(err) = self.session.close() {
            warn!(
                account = %credentials.trade_name,
                "failed to close browser session: {err}"
            );
        }
        self.state = State::Closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    use crate::prompt::testing::ScriptedPrompter;
    use crate::session::{Result as SessionResult, SessionError};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Fault {
        Navigate,
        WaitUsername,
        FillUsername,
        FillPassword,
        WaitCaptcha,
        FillCaptcha,
        WaitSubmit,
        Click,
        ReadUrl,
    }

    struct ScriptedSession {
        captcha_present: bool,
        final_url: String,
        banner: Option<String>,
        fault: Option<Fault>,
        closes: Rc<Cell<u32>>,
    }

    impl ScriptedSession {
        fn new(final_url: &str) -> Self {
            Self {
                captcha_present: true,
                final_url: final_url.to_string(),
                banner: None,
                fault: None,
                closes: Rc::new(Cell::new(0)),
            }
        }

        fn close_counter(&self) -> Rc<Cell<u32>> {
            self.closes.clone()
        }

        fn injected() -> SessionError {
            SessionError::Driver("injected fault".into())
        }
    }

    impl Session for ScriptedSession {
        fn navigate(&mut self, _url: &str) -> SessionResult<()> {
            if self.fault == Some(Fault::Navigate) {
                return Err(Self::injected());
            }
            Ok(())
        }

        fn wait_for(&mut self, selector: &str, timeout: Duration) -> SessionResult<()> {
            if selector == selectors::CAPTCHA && !self.captcha_present {
                return Err(SessionError::Timeout {
                    selector: selector.to_string(),
                    timeout,
                });
            }
            let faulted = match self.fault {
                Some(Fault::WaitUsername) => selector == selectors::USERNAME,
                Some(Fault::WaitCaptcha) => selector == selectors::CAPTCHA,
                Some(Fault::WaitSubmit) => selector == selectors::SUBMIT,
                _ => false,
            };
            if faulted {
                return Err(SessionError::Timeout {
                    selector: selector.to_string(),
                    timeout,
                });
            }
            Ok(())
        }

        fn send_keys(&mut self, selector: &str, _text: &str) -> SessionResult<()> {
            let faulted = match self.fault {
                Some(Fault::FillUsername) => selector == selectors::USERNAME,
                Some(Fault::FillPassword) => selector == selectors::PASSWORD,
                Some(Fault::FillCaptcha) => selector == selectors::CAPTCHA,
                _ => false,
            };
            if faulted {
                return Err(SessionError::NotFound(selector.to_string()));
            }
            Ok(())
        }

        fn click(&mut self, selector: &str) -> SessionResult<()> {
            if self.fault == Some(Fault::Click) {
                return Err(SessionError::NotFound(selector.to_string()));
            }
            Ok(())
        }

        fn current_url(&mut self) -> SessionResult<String> {
            if self.fault == Some(Fault::ReadUrl) {
                return Err(Self::injected());
            }
            Ok(self.final_url.clone())
        }

        fn read_text(&mut self, _selector: &str) -> SessionResult<Option<String>> {
            Ok(self.banner.clone())
        }

        fn settle(&mut self, _duration: Duration) {}

        fn close(&mut self) -> SessionResult<()> {
            self.closes.set(self.closes.get() + 1);
            Ok(())
        }
    }

    fn credentials() -> Credentials {
        Credentials {
            trade_name: "Acme Co".into(),
            username: "acme-user".into(),
            password: SecretString::new("acme-pass".into()),
        }
    }

    fn run_attempt(session: ScriptedSession, answers: &[&str]) -> (LoginOutcome, u32) {
        let closes = session.close_counter();
        let mut prompter = ScriptedPrompter::new(answers);
        let outcome = LoginMachine::new(session).attempt(
            &credentials(),
            "https://services.gst.gov.in/services/login",
            &mut prompter,
        );
        (outcome, closes.get())
    }

    #[test]
    fn test_missing_captcha_times_out_to_failure() {
        let mut session = ScriptedSession::new("https://services.gst.gov.in/services/login");
        session.captcha_present = false;

        let (outcome, closes) = run_attempt(session, &[]);
        match outcome {
            LoginOutcome::Failure { message } => {
                let message = message.unwrap();
                assert!(message.contains("#captcha"), "got: {message}");
                assert!(message.contains("FormFilled"), "got: {message}");
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(closes, 1);
    }

    #[test]
    fn test_post_login_markers_are_success() {
        for marker in ["dashboard", "home", "loggedin"] {
            let url = format!("https://services.gst.gov.in/services/{marker}");
            let session = ScriptedSession::new(&url);
            // CAPTCHA answer, then Enter at the keep-open prompt.
            let (outcome, closes) = run_attempt(session, &["AB12CD", ""]);
            assert_eq!(outcome, LoginOutcome::Success, "marker {marker}");
            assert_eq!(closes, 1, "marker {marker}");
        }
    }

    #[test]
    fn test_marker_free_location_is_failure() {
        let session = ScriptedSession::new("https://services.gst.gov.in/services/login?err=1");
        let (outcome, closes) = run_attempt(session, &["AB12CD"]);
        assert_eq!(outcome, LoginOutcome::Failure { message: None });
        assert_eq!(closes, 1);
    }

    #[test]
    fn test_error_banner_is_carried_into_failure() {
        let mut session = ScriptedSession::new("https://services.gst.gov.in/services/login");
        session.banner = Some("Invalid Captcha! Please try again.".into());

        let (outcome, _) = run_attempt(session, &["AB12CD"]);
        assert_eq!(
            outcome,
            LoginOutcome::Failure {
                message: Some("Invalid Captcha! Please try again.".into())
            }
        );
    }

    #[test]
    fn test_session_closed_exactly_once_on_every_injected_fault() {
        let faults = [
            Fault::Navigate,
            Fault::WaitUsername,
            Fault::FillUsername,
            Fault::FillPassword,
            Fault::WaitCaptcha,
            Fault::FillCaptcha,
            Fault::WaitSubmit,
            Fault::Click,
            Fault::ReadUrl,
        ];
        for fault in faults {
            let mut session = ScriptedSession::new("https://services.gst.gov.in/services/dashboard");
            session.fault = Some(fault);

            let (outcome, closes) = run_attempt(session, &["AB12CD"]);
            assert!(
                matches!(outcome, LoginOutcome::Failure { .. }),
                "fault {fault:?}"
            );
            assert_eq!(closes, 1, "fault {fault:?}");
        }
    }

    #[test]
    fn test_captcha_prompt_eof_still_closes_session() {
        let session = ScriptedSession::new("https://services.gst.gov.in/services/dashboard");
        // No scripted answers: the CAPTCHA prompt hits EOF mid-attempt.
        let (outcome, closes) = run_attempt(session, &[]);
        assert!(matches!(outcome, LoginOutcome::Failure { .. }));
        assert_eq!(closes, 1);
    }

    #[test]
    fn test_success_defers_teardown_behind_prompt() {
        let session = ScriptedSession::new("https://services.gst.gov.in/services/dashboard");
        // EOF at the keep-open prompt must not skip teardown.
        let (outcome, closes) = run_attempt(session, &["AB12CD"]);
        assert_eq!(outcome, LoginOutcome::Success);
        assert_eq!(closes, 1);
    }
}
