pub mod errors;
pub mod ledger;
pub mod models;
pub mod money;
pub mod services;
pub mod simplifier;
