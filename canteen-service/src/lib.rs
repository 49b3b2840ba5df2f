//! canteen-service: staff meal billing for client companies.
//!
//! Records meals taken by employees of client companies, prices them through
//! a three-tier override scheme, tracks payments and reports what is owed.
//! Data lives either in PostgreSQL or in JSON documents on local disk.

pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;

pub use startup::{AppState, Application};
