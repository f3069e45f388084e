//! tic-client - TIC protocol client
//!
//! This crate provides a synchronous client for the line-oriented TIC
//! (Tunnel Information and Control) protocol, along with the network
//! helpers it connects through.

pub mod net;
pub mod tic;

pub use tic::{Error, LoginOptions, Result, State, TicClient};
