//! Core type definitions for the confidential sealed-bid auction ledger.
//!
//! This crate provides the shared data structures used across the auction
//! system: opaque ciphertext handles and their typed wrappers, identities,
//! the auction record itself, and the notifications the ledger emits.

use std::fmt;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

pub mod events;

pub use events::AuctionEvent;

// =========================
// CIPHERTEXT HANDLES
// =========================

/// Opaque reference to an encrypted value held by the coprocessor (32 bytes).
///
/// A handle carries no plaintext information. The ledger can only route it
/// through the coprocessor's operation set; it deliberately supports no
/// arithmetic and no ordering.
#[derive(
    Clone, Copy, PartialEq, Eq, Hash, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct Handle(pub [u8; 32]);

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", hex::encode(self.0))
    }
}

/// Plaintext type tag of a handle, fixed at encryption time.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub enum HandleKind {
    Bool,
    Uint64,
    Address,
}

impl fmt::Display for HandleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandleKind::Bool => write!(f, "ebool"),
            HandleKind::Uint64 => write!(f, "euint64"),
            HandleKind::Address => write!(f, "eaddress"),
        }
    }
}

/// Handle to an encrypted 64-bit unsigned integer.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct EncryptedU64(Handle);

/// Handle to an encrypted identity.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct EncryptedAddress(Handle);

/// Handle to an encrypted boolean, as produced by homomorphic comparison.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct EncryptedBool(Handle);

macro_rules! typed_handle {
    ($name:ident, $kind:expr) => {
        impl $name {
            /// Wrap a raw coprocessor handle.
            pub fn new(handle: Handle) -> Self {
                Self(handle)
            }

            /// The underlying opaque handle.
            pub fn handle(&self) -> Handle {
                self.0
            }

            /// Plaintext type this handle refers to.
            pub fn kind() -> HandleKind {
                $kind
            }
        }
    };
}

typed_handle!(EncryptedU64, HandleKind::Uint64);
typed_handle!(EncryptedAddress, HandleKind::Address);
typed_handle!(EncryptedBool, HandleKind::Bool);

// =========================
// IDENTITIES
// =========================

/// Generic identity type (32 bytes).
pub type Address = [u8; 32];

/// The reserved all-zero identity. It is a legal ciphertext *value* (the
/// initial `highest_bidder` of every auction) but never an existence marker.
pub const ZERO_ADDRESS: Address = [0u8; 32];

/// Identity of a ledger instance. Input proofs are bound to the ledger they
/// were produced for, so ciphertexts cannot be replayed across deployments.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct LedgerId(pub [u8; 32]);

impl Default for LedgerId {
    fn default() -> Self {
        Self([0u8; 32])
    }
}

impl fmt::Display for LedgerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

// =========================
// AUCTION RECORD
// =========================

/// One auction listing, owned exclusively by the ledger.
///
/// `highest_bid` and `highest_bidder` are defined from creation onward
/// (initialized to the starting price and the zero identity) and are only
/// ever replaced, never cleared.
#[derive(Clone, Debug, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Auction {
    pub id: u64,
    pub seller: Address,
    pub title: String,
    pub description: String,
    /// Plaintext minimum price; also the initial value behind `highest_bid`.
    pub starting_price: u64,
    /// Absolute deadline; bids are accepted strictly before this time.
    pub end_time: u64,
    /// Monotone false -> true, flipped only by finalization.
    pub finalized: bool,
    /// Count of accepted bid submissions, winning or not.
    pub bid_count: u64,
    /// Confidential running maximum bid.
    pub highest_bid: EncryptedU64,
    /// Confidential owner of the running maximum.
    pub highest_bidder: EncryptedAddress,
}

/// Lifecycle phase of an auction, derived from the record and a timestamp.
///
/// Bidding opens at creation, so a freshly created auction is already
/// `Active`. The only edge into `Finalized` is finalization, gated on time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuctionPhase {
    /// Accepting bids: not finalized and before the deadline.
    Active,
    /// Deadline passed, finalization not yet performed.
    AwaitingFinalization,
    /// Terminal: result handles are publicly decryptable.
    Finalized,
}

impl Auction {
    /// Phase of this auction as observed at `now`.
    pub fn phase_at(&self, now: u64) -> AuctionPhase {
        if self.finalized {
            AuctionPhase::Finalized
        } else if now < self.end_time {
            AuctionPhase::Active
        } else {
            AuctionPhase::AwaitingFinalization
        }
    }

    /// Whether a bid arriving at `now` is inside the bidding window.
    pub fn accepts_bids_at(&self, now: u64) -> bool {
        self.phase_at(now) == AuctionPhase::Active
    }
}

impl fmt::Display for AuctionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuctionPhase::Active => write!(f, "active"),
            AuctionPhase::AwaitingFinalization => write!(f, "awaiting_finalization"),
            AuctionPhase::Finalized => write!(f, "finalized"),
        }
    }
}
