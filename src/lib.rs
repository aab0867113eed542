pub mod api;
pub mod config;
pub mod constants;
pub mod core;
pub mod infrastructure;

pub use crate::core::errors::DivvyError;
pub use crate::core::services::DivvyService;
pub use infrastructure::logging::in_memory::InMemoryLogging;
pub use infrastructure::storage::in_memory::InMemoryStorage;

#[cfg(test)]
mod tests;
