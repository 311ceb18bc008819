pub mod api;
pub mod cli;
pub mod error;
pub mod mcp;
pub mod models;
pub mod services;
pub mod settings;
