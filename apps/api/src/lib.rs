//! Auto-apply orchestration service.
//!
//! The library exposes the pipeline (`apply`) and its storage seam (`store`)
//! for in-process use; `main.rs` serves the same pipeline over HTTP.

pub mod apply;
pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;
