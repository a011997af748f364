pub mod backend;
pub mod config;
pub mod models;
pub mod services;

#[cfg(feature = "gui")]
pub mod app;
#[cfg(feature = "gui")]
pub mod ui;
