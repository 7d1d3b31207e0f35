//! crw - team training log service
//!
//! Accounts, teams of coaches and athletes, and daily health and training
//! records, served over JSON-RPC 2.0.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
