pub mod bot;
pub mod config;
pub mod handlers;
pub mod http;
pub mod ledger;
pub mod menu;
pub mod platform;
