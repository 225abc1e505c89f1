pub mod clear;
pub mod config;
pub mod progress;
pub mod prompts;
pub mod sync;
pub mod sync_ui;
