//! Client SDK for the confidential sealed-bid auction ledger.
//!
//! This crate provides:
//! - Bid sealing: turn a plaintext amount into an external ciphertext plus
//!   an input proof bound to one ledger and one submitter
//! - An `auction-cli` binary speaking JSON-RPC to the mock chain

pub mod bid;

pub use bid::{seal_bid, BidBuilder, PreparedBid};
