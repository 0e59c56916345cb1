pub mod build;
pub mod config;
pub mod domain;
pub mod error;
pub mod git;
pub mod operator;
pub mod pipeline;
pub mod topology;
pub mod tracker;
pub mod ui;

pub use error::{FlowError, Result};
