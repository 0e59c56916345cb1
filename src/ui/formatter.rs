//! Pure formatting functions for UI output.
//!
//! This module contains all display/formatting logic separated from user
//! interaction. Functions here are pure (no I/O side effects beyond
//! printing) and testable.

use crate::domain::SemanticVersion;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("\x1b[31mERROR:\x1b[0m {}", message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("\x1b[32m✓\x1b[0m {}", message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("\x1b[33m→\x1b[0m {}", message);
}

/// Display the version candidates the operator can pick from.
///
/// # Arguments
/// * `prompt` - Heading describing what is being selected
/// * `candidates` - Candidate versions in ascending order
pub fn display_version_candidates(prompt: &str, candidates: &[SemanticVersion]) {
    println!("\n\x1b[1m{}\x1b[0m", prompt);
    for (i, version) in candidates.iter().enumerate() {
        println!("  {}. {}", i + 1, version);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_error() {
        // Visual verification test - output is printed to stderr
        display_error("test error");
    }

    #[test]
    fn test_display_success() {
        // Visual verification test - output is printed to stdout
        display_success("test success");
    }

    #[test]
    fn test_display_version_candidates() {
        let candidates = vec![
            SemanticVersion::parse("1.3.0-rc.1").unwrap(),
            SemanticVersion::parse("1.3.0").unwrap(),
        ];
        // Visual verification test - output is printed to stdout
        display_version_candidates("Select the next version", &candidates);
    }
}
