pub mod auth;
pub mod config;
pub mod customers;
pub mod dashboard;
pub mod session;
pub mod shared;
pub mod tickets;
pub mod ui;
