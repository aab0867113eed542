pub mod audit;
pub mod expense;
pub mod group;
pub mod payment;
pub mod user;
