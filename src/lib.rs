pub mod binder;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod discovery;
pub mod extract;
pub mod model;
pub mod parser;
pub mod runner;
