//! Ledger client operations
mod client;

pub mod types;

pub use client::{Client, TopicMessageStream};
