//! Bidround Server Library
//!
//! Configuration loading and the HTTP surface of the bidding round store.
//! The binary in `main.rs` wires both to a listener.

pub mod config;
pub mod routes;
