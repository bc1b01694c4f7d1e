//! Origin authorization engine and the HTTP service that applies it.
//!
//! The engine lives in [`services::cors`]; [`middleware::cors`] is its HTTP consumer.

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;
