// HTTP server modules
pub mod handlers;
pub mod models;
pub mod routes;
pub mod state;

// Service configuration and shared types
pub mod config;
pub mod error;
pub mod session;

// External services
pub mod google;
pub mod openai;
pub mod secrets;
pub mod storage;
pub mod wordpress;

// Screening and report pipelines
pub mod analysis;
pub mod report;
