pub mod cache;
pub mod config;
pub mod errors;
pub mod export;
pub mod field_registry;
pub mod ingestor;
pub mod models;
pub mod render;
pub mod utils;

// Derived view and the session state that owns it
pub mod view;
