pub mod config;
pub mod demo_feed;
pub mod error;
pub mod export;
pub mod flags;
pub mod standings;
pub mod state;
pub mod tables;
