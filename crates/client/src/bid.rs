//! Bid sealing.
//!
//! A bid never travels in the clear. The bidder seals the value locally into
//! an external ciphertext plus an input proof bound to one ledger and one
//! submitter, and only the sealed form is submitted.

use rand::{CryptoRng, RngCore};

use auction_coprocessor::{seal_u64, ExternalCiphertext, InputProof};
use auction_types::{Address, LedgerId};

/// A sealed bid ready for submission.
#[derive(Debug, Clone)]
pub struct PreparedBid {
    /// The sealed bid payload
    pub ciphertext: ExternalCiphertext,
    /// Proof binding the ciphertext to the ledger and the submitter
    pub proof: InputProof,
    /// Original bid value (keep secret)
    pub bid_value: u64,
}

/// Seal a bid for an auction ledger.
///
/// # Arguments
/// * `ledger_id` - Identity of the ledger the bid is destined for
/// * `bidder` - The identity that will submit the bid
/// * `bid_value` - The bid amount
/// * `rng` - Cryptographically secure random number generator
///
/// # Returns
/// A prepared bid with ciphertext and binding proof. Submitting it from any
/// other identity, or to any other ledger, will be rejected on import.
pub fn seal_bid<R: RngCore + CryptoRng>(
    ledger_id: &LedgerId,
    bidder: &Address,
    bid_value: u64,
    rng: &mut R,
) -> PreparedBid {
    let (ciphertext, proof) = seal_u64(ledger_id, bidder, bid_value, rng);
    PreparedBid {
        ciphertext,
        proof,
        bid_value,
    }
}

/// Builder for sealing bids.
pub struct BidBuilder {
    ledger_id: LedgerId,
    bidder: Address,
    bid_value: u64,
}

impl BidBuilder {
    /// Create a new bid builder.
    pub fn new(ledger_id: LedgerId, bidder: Address) -> Self {
        Self {
            ledger_id,
            bidder,
            bid_value: 0,
        }
    }

    /// Set the bid value.
    pub fn bid_value(mut self, value: u64) -> Self {
        self.bid_value = value;
        self
    }

    /// Seal the bid.
    pub fn build<R: RngCore + CryptoRng>(self, rng: &mut R) -> PreparedBid {
        seal_bid(&self.ledger_id, &self.bidder, self.bid_value, rng)
    }
}
