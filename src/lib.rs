//! Music catalog service: song search, likes and genre-based recommendations.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
