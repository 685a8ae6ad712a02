pub mod account;
pub mod posts;
