pub mod cache;
pub mod config;
pub mod error;

pub use config::DocsimConfig;
pub use error::{DocsimError, Result};
