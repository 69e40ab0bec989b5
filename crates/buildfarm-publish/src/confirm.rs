//! The publish confirmation gate.

use std::io::{BufRead, Write};

/// Answers the "Is that OK?" question before a destructive transfer.
pub trait Confirmer {
    /// Return true only on an explicit affirmative.
    fn confirm(&self, prompt: &str) -> bool;
}

/// Interactive confirmer reading from stdin. Accepts `y`/`yes`
/// (case-insensitive); anything else, including EOF, declines.
#[derive(Debug, Default)]
pub struct StdinConfirmer;

impl Confirmer for StdinConfirmer {
    fn confirm(&self, prompt: &str) -> bool {
        print!("{prompt} [y/N] ");
        std::io::stdout().flush().ok();

        let mut answer = String::new();
        if std::io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

/// Non-interactive confirmer that always answers yes (the `--yes` flag).
#[derive(Debug, Default)]
pub struct AssumeYes;

impl Confirmer for AssumeYes {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assume_yes_always_affirms() {
        assert!(AssumeYes.confirm("really?"));
    }
}
