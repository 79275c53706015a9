pub mod api;
pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod render;
pub mod sync;
pub mod view;
pub mod workers;
