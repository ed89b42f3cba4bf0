pub mod app;
pub mod cli;
pub mod collector;
pub mod config;
pub mod discovery;
pub mod models;
pub mod output;
pub mod report;
pub mod sources;
#[cfg(test)]
mod testing;
