//! Operator collaborator - the human driving the release
//!
//! The pipeline never reads stdin directly; every decision point goes
//! through this trait. The console implementation lives in [crate::ui],
//! [ScriptedOperator] backs the tests.

use crate::domain::SemanticVersion;
use crate::error::{FlowError, Result};
use std::sync::Mutex;

/// Operator collaborator contract
pub trait Operator: Send + Sync {
    /// Ask the operator to pick one of the candidate versions
    fn read_version_choice(
        &self,
        prompt: &str,
        candidates: &[SemanticVersion],
    ) -> Result<SemanticVersion>;

    /// Ask the operator to pick one of the given strings
    fn read_string_choice(&self, prompt: &str, choices: &[String]) -> Result<String>;

    /// Ask the operator for a free-form string
    fn read_string(&self, prompt: &str) -> Result<String>;

    /// Ask the operator a yes/no question
    fn read_confirmation(&self, prompt: &str) -> Result<bool>;
}

/// A scripted answer for [ScriptedOperator]
#[derive(Debug, Clone)]
pub enum Answer {
    Version(SemanticVersion),
    Choice(String),
    Text(String),
    Confirm(bool),
}

/// Operator test double answering from a fixed script
///
/// Answers are consumed in order; a mismatch between the asked question
/// kind and the scripted answer is an error, as is running out of script.
pub struct ScriptedOperator {
    answers: Mutex<Vec<Answer>>,
    questions: Mutex<Vec<String>>,
}

impl ScriptedOperator {
    pub fn new(answers: Vec<Answer>) -> Self {
        ScriptedOperator {
            answers: Mutex::new(answers),
            questions: Mutex::new(Vec::new()),
        }
    }

    /// Every prompt asked so far, in order
    pub fn questions(&self) -> Vec<String> {
        self.questions.lock().unwrap().clone()
    }

    fn next_answer(&self, prompt: &str) -> Result<Answer> {
        self.questions.lock().unwrap().push(prompt.to_string());
        let mut answers = self.answers.lock().unwrap();
        if answers.is_empty() {
            return Err(FlowError::config(format!(
                "Scripted operator has no answer left for: {}",
                prompt
            )));
        }
        Ok(answers.remove(0))
    }
}

impl Operator for ScriptedOperator {
    fn read_version_choice(
        &self,
        prompt: &str,
        candidates: &[SemanticVersion],
    ) -> Result<SemanticVersion> {
        match self.next_answer(prompt)? {
            Answer::Version(v) => {
                if !candidates.contains(&v) {
                    return Err(FlowError::config(format!(
                        "Scripted version {} not among candidates",
                        v
                    )));
                }
                Ok(v)
            }
            other => Err(FlowError::config(format!(
                "Expected a version answer for '{}', got {:?}",
                prompt, other
            ))),
        }
    }

    fn read_string_choice(&self, prompt: &str, choices: &[String]) -> Result<String> {
        match self.next_answer(prompt)? {
            Answer::Choice(s) => {
                if !choices.contains(&s) {
                    return Err(FlowError::config(format!(
                        "Scripted choice '{}' not among options",
                        s
                    )));
                }
                Ok(s)
            }
            other => Err(FlowError::config(format!(
                "Expected a choice answer for '{}', got {:?}",
                prompt, other
            ))),
        }
    }

    fn read_string(&self, prompt: &str) -> Result<String> {
        match self.next_answer(prompt)? {
            Answer::Text(s) => Ok(s),
            other => Err(FlowError::config(format!(
                "Expected a text answer for '{}', got {:?}",
                prompt, other
            ))),
        }
    }

    fn read_confirmation(&self, prompt: &str) -> Result<bool> {
        match self.next_answer(prompt)? {
            Answer::Confirm(b) => Ok(b),
            other => Err(FlowError::config(format!(
                "Expected a confirmation answer for '{}', got {:?}",
                prompt, other
            ))),
        }
    }
}
