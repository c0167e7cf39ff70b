// Command handlers module
pub mod config;
pub mod fan;
pub mod plans;
pub mod run;
pub mod snapshot;
