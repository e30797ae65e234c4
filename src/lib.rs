pub mod cli;
pub mod collector;
pub mod config;
pub mod endpoint;
pub mod logging;
pub mod parser;
pub mod store;
