use std::io::{self, BufRead, Write};

/// Line-oriented operator input. Flows depend on this trait rather than stdin
/// directly so they can be driven by a scripted supplier in tests.
pub trait Prompter {
    fn read_line(&mut self, prompt: &str) -> io::Result<String>;

    fn read_password(&mut self, prompt: &str) -> io::Result<String>;

    /// Asks a yes/no question, defaulting to no.
    fn confirm(&mut self, question: &str) -> io::Result<bool> {
        let answer = self.read_line(&format!("{question} [y/N]: "))?;
        Ok(answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
    }
}

/// Prompter over the process stdin/stdout.
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn read_line(&mut self, prompt: &str) -> io::Result<String> {
        print!("{prompt}");
        io::stdout().flush()?;

        let mut answer = String::new();
        let read = io::stdin().lock().read_line(&mut answer)?;
        // A closed stdin is an error, not an empty answer, so menu loops
        // cannot spin when the tool is run headless.
        if read == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed"));
        }
        Ok(answer.trim().to_string())
    }

    fn read_password(&mut self, prompt: &str) -> io::Result<String> {
        let value = rpassword::prompt_password(prompt)?;
        Ok(value.trim().to_string())
    }
}
