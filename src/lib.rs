//! # Showroom Back Office Library
//!
//! Server side of a used-car showroom back office: a typed client for the
//! hosted data backend, role-based sessions, the inventory filter composer,
//! page controllers and the HTTP API that serves them with the built UI.

pub mod auth;
pub mod backend;
pub mod config;
pub mod controllers;
pub mod error;
pub mod filters;
pub mod format;
pub mod handlers;
pub mod models;
pub mod server;
pub mod telemetry;
