pub mod auth;
pub mod core;
pub mod main_module;
pub mod reports;
pub mod security;
pub mod storage;
pub mod tasks;
pub mod users;

pub use crate::core::shared;
