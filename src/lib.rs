// Webhook payload model and message discovery
pub mod payload;

// Per-message field extraction
pub mod extract;

// Timestamp normalization
pub mod timestamp;

// Flat log records
pub mod record;

// Append-only message log
pub mod store;

// Service configuration
pub mod config;

// HTTP endpoints
pub mod api;
