//! Headshot studio server library.
//!
//! Receives AI provider webhooks, dispatches generation jobs, and runs the
//! fetch / store / watermark pipeline over generated images.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod services;
