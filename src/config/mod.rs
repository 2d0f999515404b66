pub mod app_config;
pub mod database;

pub use app_config::{AppConfig, ConfigError, MalformedLinePolicy, NotifierConfig};
pub use database::establish_connection;
