//! Interactive input capability.

use std::io::{self, BufRead, Write};

/// Reads a single line of input from the user.
///
/// `read_string` echoes what the user types; `read_password` does not.
/// Both calls block until the user answers.
pub trait Reader: Send + Sync {
    fn read_string(&self, prompt: &str) -> io::Result<String>;
    fn read_password(&self, prompt: &str) -> io::Result<String>;
}

/// Production reader backed by the process's standard input.
///
/// Prompts go to stderr so stdout stays clean for the token output.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinReader;

impl Reader for StdinReader {
    fn read_string(&self, prompt: &str) -> io::Result<String> {
        {
            let mut stderr = io::stderr().lock();
            write!(stderr, "{prompt}")?;
            stderr.flush()?;
        }
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        if line.is_empty() {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed"));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn read_password(&self, prompt: &str) -> io::Result<String> {
        rpassword::prompt_password(prompt)
    }
}
