//! HTTP server for the megaphone campaign chat agent.

pub mod config;
pub mod routes;
