pub mod claims;
pub mod error;
pub mod posts;
pub mod query;
