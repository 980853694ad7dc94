pub mod admin;
pub mod app;
pub mod appliances;
pub mod auth;
pub mod centers;
pub mod config;
pub mod db;
pub mod error;
pub mod identity;
pub mod memory;
pub mod policy;
pub mod seed;
pub mod state;
pub mod telemetry;
