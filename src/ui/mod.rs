//! User interface module - interaction (prompts) and formatting.
//!
//! Separates concerns:
//! - `formatter` - Pure formatting functions
//! - This module - Interactive prompts backing the [Operator] contract

use std::io::{self, Write};

use crate::domain::SemanticVersion;
use crate::error::{FlowError, Result};
use crate::operator::Operator;

pub mod formatter;

// Re-export formatter functions for convenience
pub use formatter::{display_error, display_status, display_success, display_version_candidates};

/// Console-backed operator reading answers from stdin
///
/// Selection prompts display a numbered list and accept a 1-based index;
/// pressing Enter picks the first entry.
pub struct ConsoleOperator;

impl ConsoleOperator {
    pub fn new() -> Self {
        ConsoleOperator
    }

    fn read_line(&self) -> Result<String> {
        io::stdout().flush()?;
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        Ok(input.trim().to_string())
    }

    fn read_index(&self, upper: usize) -> Result<usize> {
        print!("\nSelect (1-{}) [default: 1]: ", upper);
        let selection = self.read_line()?;

        // Empty input defaults to the first entry
        let index = if selection.is_empty() {
            1
        } else {
            selection.parse::<usize>().unwrap_or(0)
        };

        if index > 0 && index <= upper {
            Ok(index - 1)
        } else {
            Err(FlowError::config(format!(
                "Invalid selection '{}'",
                selection
            )))
        }
    }
}

impl Default for ConsoleOperator {
    fn default() -> Self {
        Self::new()
    }
}

impl Operator for ConsoleOperator {
    fn read_version_choice(
        &self,
        prompt: &str,
        candidates: &[SemanticVersion],
    ) -> Result<SemanticVersion> {
        if candidates.len() == 1 {
            return Ok(candidates[0]);
        }
        formatter::display_version_candidates(prompt, candidates);
        let index = self.read_index(candidates.len())?;
        Ok(candidates[index])
    }

    fn read_string_choice(&self, prompt: &str, choices: &[String]) -> Result<String> {
        if choices.len() == 1 {
            return Ok(choices[0].clone());
        }
        println!("\n\x1b[1m{}\x1b[0m", prompt);
        for (i, choice) in choices.iter().enumerate() {
            println!("  {}. {}", i + 1, choice);
        }
        let index = self.read_index(choices.len())?;
        Ok(choices[index].clone())
    }

    fn read_string(&self, prompt: &str) -> Result<String> {
        print!("\n{}: ", prompt);
        self.read_line()
    }

    fn read_confirmation(&self, prompt: &str) -> Result<bool> {
        print!("\n{} (y/N): ", prompt);
        let response = self.read_line()?.to_lowercase();
        Ok(response == "y" || response == "yes")
    }
}
