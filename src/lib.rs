pub mod config;
pub mod logging;
pub mod scraper;
pub mod services;
