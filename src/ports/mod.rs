//! Port traits for the collaborators around the core.

pub mod config_port;
pub mod price_port;
pub mod result_store_port;
