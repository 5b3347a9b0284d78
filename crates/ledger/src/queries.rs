//! Query handlers for the auction ledger.
//!
//! These functions provide read-only access to ledger state. None of them
//! mutate anything: queries are outside the call log and run against the
//! state left by the last applied transaction.

use serde::{Deserialize, Serialize};

use auction_coprocessor::Coprocessor;
use auction_types::{
    Address, Auction, AuctionEvent, AuctionPhase, EncryptedAddress, EncryptedU64,
};

use crate::error::AuctionError;
use crate::state::LedgerState;

/// Get auction by id.
pub fn get_auction(state: &LedgerState, auction_id: u64) -> Result<&Auction, AuctionError> {
    state
        .get_auction(auction_id)
        .ok_or(AuctionError::AuctionNotFound(auction_id))
}

/// Handle of the confidential running-maximum bid.
///
/// The handle itself is public information; decrypting it is what the
/// access list gates.
pub fn get_encrypted_highest_bid(
    state: &LedgerState,
    auction_id: u64,
) -> Result<EncryptedU64, AuctionError> {
    Ok(get_auction(state, auction_id)?.highest_bid)
}

/// Handle of the confidential leading bidder.
pub fn get_encrypted_highest_bidder(
    state: &LedgerState,
    auction_id: u64,
) -> Result<EncryptedAddress, AuctionError> {
    Ok(get_auction(state, auction_id)?.highest_bidder)
}

/// Whether the auction's result can be decrypted by anyone.
///
/// True only when the auction is finalized and the coprocessor confirms the
/// promotion of the stored result handle.
pub fn is_result_public(
    state: &LedgerState,
    cop: &dyn Coprocessor,
    auction_id: u64,
) -> Result<bool, AuctionError> {
    let auction = get_auction(state, auction_id)?;
    if !auction.finalized {
        return Ok(false);
    }
    Ok(cop.is_publicly_decryptable(auction.highest_bid.handle())?)
}

/// Number of auctions ever created.
pub fn get_auction_count(state: &LedgerState) -> u64 {
    state.auction_count
}

/// Query request types.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum AuctionQuery {
    /// Get auction details by id.
    GetAuction { auction_id: u64 },

    /// Get the handle of the confidential running-maximum bid.
    GetEncryptedHighestBid { auction_id: u64 },

    /// Get the handle of the confidential leading bidder.
    GetEncryptedHighestBidder { auction_id: u64 },

    /// Whether the auction's result is publicly decryptable.
    IsResultPublic { auction_id: u64 },

    /// Get the lifetime auction count.
    GetAuctionCount,

    /// List auction summaries (paginated, ordered by id).
    ListAuctions { offset: u64, limit: u64 },

    /// List auctions currently accepting bids.
    ListActiveAuctions,

    /// Get the notification log, optionally restricted to one auction.
    GetEvents { auction_id: Option<u64> },
}

/// Query response types.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum AuctionQueryResponse {
    /// Auction details.
    Auction(Auction),

    /// Running-maximum bid handle.
    EncryptedHighestBid(EncryptedU64),

    /// Leading-bidder handle.
    EncryptedHighestBidder(EncryptedAddress),

    /// Public decryptability of the result.
    ResultPublic(bool),

    /// Lifetime auction count.
    AuctionCount(u64),

    /// List of auction summaries.
    AuctionList(Vec<AuctionSummary>),

    /// Notification log slice.
    Events(Vec<AuctionEvent>),
}

/// Handle a query against the state as of `now`.
pub fn handle_query(
    state: &LedgerState,
    cop: &dyn Coprocessor,
    now: u64,
    query: AuctionQuery,
) -> Result<AuctionQueryResponse, AuctionError> {
    match query {
        AuctionQuery::GetAuction { auction_id } => Ok(AuctionQueryResponse::Auction(
            get_auction(state, auction_id)?.clone(),
        )),

        AuctionQuery::GetEncryptedHighestBid { auction_id } => Ok(
            AuctionQueryResponse::EncryptedHighestBid(get_encrypted_highest_bid(
                state, auction_id,
            )?),
        ),

        AuctionQuery::GetEncryptedHighestBidder { auction_id } => Ok(
            AuctionQueryResponse::EncryptedHighestBidder(get_encrypted_highest_bidder(
                state, auction_id,
            )?),
        ),

        AuctionQuery::IsResultPublic { auction_id } => Ok(AuctionQueryResponse::ResultPublic(
            is_result_public(state, cop, auction_id)?,
        )),

        AuctionQuery::GetAuctionCount => {
            Ok(AuctionQueryResponse::AuctionCount(get_auction_count(state)))
        }

        AuctionQuery::ListAuctions { offset, limit } => Ok(AuctionQueryResponse::AuctionList(
            get_auction_summaries(state, now, offset as usize, limit as usize),
        )),

        AuctionQuery::ListActiveAuctions => Ok(AuctionQueryResponse::AuctionList(
            get_active_auctions(state, now),
        )),

        AuctionQuery::GetEvents { auction_id } => {
            Ok(AuctionQueryResponse::Events(get_events(state, auction_id)))
        }
    }
}

/// Summary of an auction for listing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuctionSummary {
    pub auction_id: u64,
    pub seller: Address,
    pub title: String,
    pub starting_price: u64,
    pub end_time: u64,
    pub phase: AuctionPhase,
    pub bid_count: u64,
}

impl AuctionSummary {
    /// Create a summary from an auction record as observed at `now`.
    pub fn from_auction(auction: &Auction, now: u64) -> Self {
        Self {
            auction_id: auction.id,
            seller: auction.seller,
            title: auction.title.clone(),
            starting_price: auction.starting_price,
            end_time: auction.end_time,
            phase: auction.phase_at(now),
            bid_count: auction.bid_count,
        }
    }
}

/// Get auction summaries for listing, ordered by id.
pub fn get_auction_summaries(
    state: &LedgerState,
    now: u64,
    offset: usize,
    limit: usize,
) -> Vec<AuctionSummary> {
    let mut ids: Vec<u64> = state.auctions.keys().copied().collect();
    ids.sort_unstable();
    ids.into_iter()
        .skip(offset)
        .take(limit)
        .filter_map(|id| state.get_auction(id))
        .map(|auction| AuctionSummary::from_auction(auction, now))
        .collect()
}

/// Get auctions currently accepting bids, ordered by id.
pub fn get_active_auctions(state: &LedgerState, now: u64) -> Vec<AuctionSummary> {
    let mut active: Vec<AuctionSummary> = state
        .auctions
        .values()
        .filter(|auction| auction.accepts_bids_at(now))
        .map(|auction| AuctionSummary::from_auction(auction, now))
        .collect();
    active.sort_unstable_by_key(|summary| summary.auction_id);
    active
}

/// Get the notification log, optionally restricted to one auction.
pub fn get_events(state: &LedgerState, auction_id: Option<u64>) -> Vec<AuctionEvent> {
    match auction_id {
        None => state.events.clone(),
        Some(id) => state
            .events
            .iter()
            .filter(|event| event.auction_id() == id)
            .cloned()
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auction_coprocessor::MockCoprocessor;

    use crate::config::LedgerConfig;
    use crate::handlers::{handle_create_auction, handle_finalize_auction, CallContext};

    const SELLER: Address = [1u8; 32];

    fn state_with_one_auction() -> (LedgerState, MockCoprocessor) {
        let mut state = LedgerState::new(LedgerConfig::default());
        let mut cop = MockCoprocessor::new();
        let ctx = CallContext {
            sender: SELLER,
            block_height: 1,
            timestamp: 1000,
        };
        handle_create_auction(
            &mut state,
            &mut cop,
            &ctx,
            "lot".to_string(),
            String::new(),
            100,
            500,
        )
        .unwrap();
        cop.next_transaction();
        (state, cop)
    }

    #[test]
    fn test_get_auction_not_found() {
        let state = LedgerState::default();
        assert!(matches!(
            get_auction(&state, 9),
            Err(AuctionError::AuctionNotFound(9))
        ));
    }

    #[test]
    fn test_result_is_not_public_before_finalization() {
        let (state, cop) = state_with_one_auction();
        assert!(!is_result_public(&state, &cop, 1).unwrap());
    }

    #[test]
    fn test_result_is_public_after_finalization() {
        let (mut state, mut cop) = state_with_one_auction();
        let ctx = CallContext {
            sender: [9u8; 32],
            block_height: 2,
            timestamp: 1500,
        };
        handle_finalize_auction(&mut state, &mut cop, &ctx, 1).unwrap();
        cop.next_transaction();

        assert!(is_result_public(&state, &cop, 1).unwrap());
    }

    #[test]
    fn test_active_listing_empties_after_the_deadline() {
        let (state, _cop) = state_with_one_auction();

        assert_eq!(get_active_auctions(&state, 1200).len(), 1);
        assert!(get_active_auctions(&state, 1500).is_empty());

        let all = get_auction_summaries(&state, 1500, 0, 10);
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].phase, AuctionPhase::AwaitingFinalization);
    }

    #[test]
    fn test_event_filter_by_auction() {
        let (mut state, mut cop) = state_with_one_auction();
        let ctx = CallContext {
            sender: SELLER,
            block_height: 3,
            timestamp: 1000,
        };
        handle_create_auction(
            &mut state,
            &mut cop,
            &ctx,
            "second lot".to_string(),
            String::new(),
            50,
            500,
        )
        .unwrap();

        assert_eq!(get_events(&state, None).len(), 2);
        assert_eq!(get_events(&state, Some(2)).len(), 1);
        assert!(get_events(&state, Some(3)).is_empty());
    }

    #[test]
    fn test_handle_query_round_trip() {
        let (state, cop) = state_with_one_auction();

        let response = handle_query(&state, &cop, 1100, AuctionQuery::GetAuctionCount).unwrap();
        assert!(matches!(response, AuctionQueryResponse::AuctionCount(1)));

        let response = handle_query(
            &state,
            &cop,
            1100,
            AuctionQuery::GetAuction { auction_id: 1 },
        )
        .unwrap();
        match response {
            AuctionQueryResponse::Auction(auction) => assert_eq!(auction.id, 1),
            other => panic!("unexpected response: {other:?}"),
        }

        assert!(handle_query(
            &state,
            &cop,
            1100,
            AuctionQuery::GetAuction { auction_id: 99 },
        )
        .is_err());
    }
}
