// src/lib.rs
pub mod analytics;
pub mod api;
pub mod auth;
pub mod banner;
pub mod config;
pub mod database;
pub mod errors;
pub mod generator;
pub mod import;
pub mod language;
pub mod models;
pub mod providers;
pub mod roster;
pub mod scheduler;
pub mod scoring;
