pub mod category;
pub mod checks;
pub mod clients;
pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod layout;
pub mod orchestrator;
pub mod publish;
pub mod report;
pub mod requirements;
pub mod stdlib;

pub use error::{Result, ValidatorError};
