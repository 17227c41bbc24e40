pub mod config;
pub mod error;
pub mod models;
pub mod provider;
pub mod tasks;
pub mod view;
pub mod voting;
