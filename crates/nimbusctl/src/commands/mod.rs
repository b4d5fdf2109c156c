//! Command handlers.

pub mod auth;
pub mod branches;
pub mod me;
pub mod projects;
