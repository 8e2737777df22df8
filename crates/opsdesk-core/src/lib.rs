pub mod config;
pub mod error;
pub mod events;
pub mod types;

pub use config::OpsdeskConfig;
pub use error::{OpsdeskError, Result};
pub use events::DomainEvent;
pub use types::*;
