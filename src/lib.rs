// Library exports for swapboard
// This allows integration tests and external code to use swapboard modules

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;
pub mod store;
