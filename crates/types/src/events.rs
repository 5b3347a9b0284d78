//! Notifications emitted by the ledger for off-system observers.
//!
//! Events are appended to the ledger's ordered log as part of the emitting
//! transaction. `BidPlaced` deliberately carries only the auction id and the
//! bidder identity: it must not reveal whether the bid became the new leader.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::Address;

/// A single ledger notification.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub enum AuctionEvent {
    /// A new auction was created and is accepting bids.
    AuctionCreated {
        id: u64,
        seller: Address,
        title: String,
        starting_price: u64,
        end_time: u64,
    },

    /// A structurally valid bid was accepted, win or lose.
    BidPlaced { id: u64, bidder: Address },

    /// The auction result was promoted to public decryptability.
    AuctionFinalized { id: u64 },
}

impl AuctionEvent {
    /// Id of the auction this event belongs to.
    pub fn auction_id(&self) -> u64 {
        match self {
            AuctionEvent::AuctionCreated { id, .. } => *id,
            AuctionEvent::BidPlaced { id, .. } => *id,
            AuctionEvent::AuctionFinalized { id } => *id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auction_id_accessor() {
        let created = AuctionEvent::AuctionCreated {
            id: 7,
            seller: [1u8; 32],
            title: "lot".to_string(),
            starting_price: 50,
            end_time: 900,
        };
        let bid = AuctionEvent::BidPlaced {
            id: 7,
            bidder: [2u8; 32],
        };
        let finalized = AuctionEvent::AuctionFinalized { id: 7 };

        assert_eq!(created.auction_id(), 7);
        assert_eq!(bid.auction_id(), 7);
        assert_eq!(finalized.auction_id(), 7);
    }
}
