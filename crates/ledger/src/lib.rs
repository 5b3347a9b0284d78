//! Confidential sealed-bid auction ledger.
//!
//! This crate implements the ledger component of the auction system. It
//! owns all auction records and drives every interaction with the external
//! homomorphic coprocessor, so that the running maximum bid and its holder
//! stay encrypted end to end:
//!
//! - Auction creation seeds an encrypted running maximum (starting price,
//!   zero identity) visible only to the seller
//! - Sealed bids are imported under sender-bound proofs and folded into the
//!   maximum with one strict comparison and two selections
//! - Finalization is permissionless after the deadline and promotes the
//!   result handles to public decryptability
//!
//! # Architecture
//!
//! - `call`: Message types for state-changing operations
//! - `handlers`: Business logic for processing calls
//! - `queries`: Read-only state access
//! - `state`: Ledger state structures
//! - `config`: Deployment configuration
//! - `error`: Error types
//!
//! # Example
//!
//! ```ignore
//! use auction_ledger::{handlers, AuctionCall, LedgerConfig, LedgerState};
//!
//! let mut state = LedgerState::new(LedgerConfig::default());
//! let ctx = handlers::CallContext { ... };
//!
//! // Create an auction
//! let auction_id = handlers::handle_create_auction(&mut state, &mut cop, &ctx, ...)?;
//!
//! // Submit a sealed bid
//! handlers::handle_place_bid(&mut state, &mut cop, &ctx, auction_id, &ciphertext, &proof)?;
//! ```

pub mod call;
pub mod config;
pub mod error;
pub mod handlers;
pub mod queries;
pub mod state;

pub use call::{AuctionCall, CallOutcome};
pub use config::{ConfigValidationError, LedgerConfig};
pub use error::AuctionError;
pub use handlers::{apply_call, CallContext, HandlerResult};
pub use queries::{AuctionQuery, AuctionQueryResponse, AuctionSummary};
pub use state::LedgerState;
