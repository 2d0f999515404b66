pub mod config;
pub mod entity;
pub mod event;
pub mod ingest;
pub mod monitoring;
pub mod shutdown;
pub mod state;
pub mod utils;
