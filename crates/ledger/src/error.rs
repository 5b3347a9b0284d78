//! Auction ledger error types.

use thiserror::Error;

use auction_coprocessor::CoprocessorError;

/// Errors that can occur in the auction ledger.
///
/// A failed call has no effect: every validation and every fallible
/// coprocessor interaction happens before the first state write.
#[derive(Debug, Error)]
pub enum AuctionError {
    #[error("Auction not found: {0}")]
    AuctionNotFound(u64),

    #[error("Title cannot be empty")]
    EmptyTitle,

    #[error("Title too long: limit is {max} bytes")]
    TitleTooLong { max: usize },

    #[error("Description too long: limit is {max} bytes")]
    DescriptionTooLong { max: usize },

    #[error("Auction duration must be nonzero and the end time must fit in a u64")]
    InvalidDuration,

    #[error("Auction already finalized: {0}")]
    AuctionAlreadyFinalized(u64),

    #[error("Auction {id} ended at {end_time}; bidding is closed")]
    AuctionEnded { id: u64, end_time: u64 },

    #[error("Auction {id} is still active until {end_time}")]
    AuctionStillActive { id: u64, end_time: u64 },

    #[error(transparent)]
    Coprocessor(#[from] CoprocessorError),
}
