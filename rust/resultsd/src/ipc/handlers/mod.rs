pub mod auth;
pub mod collections;
pub mod core;
pub mod listeners;
pub mod maintenance;
