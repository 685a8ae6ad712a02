//! Application services: listing controller, editor, accounts and session state.

pub mod accounts;
pub mod api;
pub mod confirm;
pub mod editor;
pub mod error;
pub mod listing;
pub mod session;
