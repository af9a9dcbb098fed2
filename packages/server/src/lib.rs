// Job Application Tracker - Lifecycle Core
//
// This crate provides the backend engine for tracking job applications:
// a durable per-application lifecycle orchestrator, redundant deadline
// sweeps, and a notification broadcast hub for connected clients.
//
// Workflows are organized per-domain in domains/*/workflows/

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;

pub use config::*;
