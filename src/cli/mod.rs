pub mod app;
pub mod backup;
pub mod commands;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod env;
pub mod output;
pub mod puzzle;
pub mod runtime;
pub mod scrape;
pub mod solve;
