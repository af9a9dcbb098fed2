pub mod activities;
pub mod models;
pub mod store;
pub mod sweeps;
pub mod workflows;
