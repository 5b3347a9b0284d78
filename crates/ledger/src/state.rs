//! Ledger state for the auction system.

use std::collections::HashMap;

use auction_types::{Auction, AuctionEvent};

use crate::config::LedgerConfig;

/// Auction ledger state.
///
/// One instance per deployment. The host applies calls one at a time in a
/// total order, and a failed call returns before the first write, so
/// observers never see a partial update.
#[derive(Debug, Default)]
pub struct LedgerState {
    /// Deployment configuration, fixed at initialization.
    pub config: LedgerConfig,

    /// Number of auctions ever created. Also the id of the most recently
    /// created auction: ids are allocated by incrementing this counter.
    pub auction_count: u64,

    /// All auctions by id.
    pub auctions: HashMap<u64, Auction>,

    /// Ordered log of emitted notifications.
    pub events: Vec<AuctionEvent>,
}

impl LedgerState {
    /// Create a fresh ledger with the given configuration.
    pub fn new(config: LedgerConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Allocate the next auction id.
    ///
    /// Increments the lifetime count first, so a new auction's id always
    /// equals the count after its creation.
    pub fn allocate_auction_id(&mut self) -> u64 {
        self.auction_count += 1;
        self.auction_count
    }

    /// Get auction by id.
    pub fn get_auction(&self, auction_id: u64) -> Option<&Auction> {
        self.auctions.get(&auction_id)
    }

    /// Get mutable auction by id.
    pub fn get_auction_mut(&mut self, auction_id: u64) -> Option<&mut Auction> {
        self.auctions.get_mut(&auction_id)
    }

    /// Append a notification to the event log.
    pub fn record_event(&mut self, event: AuctionEvent) {
        self.events.push(event);
    }
}
