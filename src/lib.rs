// src/lib.rs

pub mod authoring;
pub mod config;
pub mod error;
pub mod grading;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod seed;
pub mod session;
pub mod state;
pub mod store;
pub mod utils;

pub use routes::create_router;
