pub mod config;
pub mod popups;
