pub mod channel;
pub mod config;
pub mod discovery;
pub mod error;
pub mod nat_type;
