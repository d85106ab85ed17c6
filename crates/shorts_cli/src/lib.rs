//! Terminal front end: flags, config file, logging setup and the job run.
pub mod app;
pub mod cli;
pub mod config;
pub mod render;
