pub mod app;
pub mod config;
pub mod dom;
pub mod models;
pub mod parser;
pub mod render;
