//! End-to-end integration tests for the confidential auction ledger.
//!
//! These tests exercise the full auction lifecycle:
//! 1. Ledger setup
//! 2. Auction creation
//! 3. Bid sealing and submission through the client SDK
//! 4. Confidential maximum tracking on the coprocessor
//! 5. Finalization and public reveal

use auction_client::seal_bid;
use auction_coprocessor::{Coprocessor, CoprocessorError, MockCoprocessor};
use auction_ledger::{
    apply_call, queries, AuctionCall, AuctionError, CallContext, CallOutcome, LedgerConfig,
    LedgerState,
};
use auction_types::{Address, AuctionEvent, LedgerId, ZERO_ADDRESS};
use rand::rngs::OsRng;

/// Test the complete auction flow against an in-process coprocessor.
#[test]
fn test_full_auction_flow() {
    // ========================================
    // Phase 1: Setup - ledger and coprocessor
    // ========================================

    let ledger_id = LedgerId([9u8; 32]);
    let mut state = LedgerState::new(LedgerConfig::with_ledger_id(ledger_id));
    let mut cop = MockCoprocessor::new();

    println!("Setup complete: ledger {} ready", ledger_id);

    // ========================================
    // Phase 2: Create auction
    // ========================================

    let outcome = apply(
        &mut state,
        &mut cop,
        &ctx(SELLER, 100),
        AuctionCall::CreateAuction {
            title: "Vintage synthesizer".to_string(),
            description: "One careful owner".to_string(),
            starting_price: 100,
            duration: 7200,
        },
    )
    .expect("Failed to create auction");

    let auction_id = match outcome {
        CallOutcome::AuctionCreated(id) => id,
        other => panic!("Unexpected outcome: {:?}", other),
    };
    assert_eq!(auction_id, 1);
    assert_eq!(queries::get_auction_count(&state), 1);

    let auction = queries::get_auction(&state, auction_id).expect("Missing auction");
    assert_eq!(auction.end_time, 7300);
    assert_eq!(auction.bid_count, 0);

    // The seller can read the opening state; nobody else can
    let opening_bid = queries::get_encrypted_highest_bid(&state, auction_id).unwrap();
    let opening_bidder = queries::get_encrypted_highest_bidder(&state, auction_id).unwrap();
    assert_eq!(cop.decrypt_u64(&opening_bid, &SELLER).unwrap(), 100);
    assert_eq!(
        cop.decrypt_address(&opening_bidder, &SELLER).unwrap(),
        ZERO_ADDRESS
    );
    assert!(cop.decrypt_u64(&opening_bid, &ALICE).is_err());

    println!("Auction {} created, ends at {}", auction_id, auction.end_time);

    // ========================================
    // Phase 3: Sealed bids
    // ========================================

    place_bid(&mut state, &mut cop, &ledger_id, ALICE, auction_id, 250, 200)
        .expect("Failed to place bid A");
    place_bid(&mut state, &mut cop, &ledger_id, BOB, auction_id, 200, 300)
        .expect("Failed to place bid B");
    place_bid(&mut state, &mut cop, &ledger_id, BOB, auction_id, 375, 400)
        .expect("Failed to place bid C");

    let auction = queries::get_auction(&state, auction_id).unwrap();
    assert_eq!(auction.bid_count, 3);

    // The stored handles rotate on every bid
    assert_ne!(auction.highest_bid.handle(), opening_bid.handle());

    // The seller can watch the running maximum move; bidders cannot
    assert_eq!(cop.decrypt_u64(&auction.highest_bid, &SELLER).unwrap(), 375);
    assert_eq!(cop.decrypt_address(&auction.highest_bidder, &SELLER).unwrap(), BOB);
    assert!(cop.decrypt_u64(&auction.highest_bid, &BOB).is_err());

    println!("3 bids accepted");

    // ========================================
    // Phase 4: Finalize and reveal
    // ========================================

    assert!(!queries::is_result_public(&state, &cop, auction_id).unwrap());

    // Anyone may finalize once the deadline passes
    apply(
        &mut state,
        &mut cop,
        &ctx(CAROL, 7300),
        AuctionCall::FinalizeAuction { auction_id },
    )
    .expect("Failed to finalize");

    assert!(queries::is_result_public(&state, &cop, auction_id).unwrap());

    // The result now decrypts for a complete stranger
    let winning_bid = queries::get_encrypted_highest_bid(&state, auction_id).unwrap();
    let winning_bidder = queries::get_encrypted_highest_bidder(&state, auction_id).unwrap();
    assert_eq!(cop.decrypt_u64(&winning_bid, &OUTSIDER).unwrap(), 375);
    assert_eq!(cop.decrypt_address(&winning_bidder, &OUTSIDER).unwrap(), BOB);
    assert!(queries::get_auction(&state, auction_id).unwrap().finalized);

    println!("\nAuction settled successfully!");
    println!("  Winning price: 375");
    println!("  Winner: Bidder B");
}

/// Auction ids and the lifetime count stay in lockstep.
#[test]
fn test_auction_ids_match_lifetime_count() {
    let (mut state, mut cop) = test_ledger();

    for expected in 1..=3u64 {
        let id = create_auction(&mut state, &mut cop, SELLER, 100, 3600);
        assert_eq!(id, expected);
        assert_eq!(queries::get_auction_count(&state), expected);
    }
}

/// The deadline is exclusive: the last accepted instant is end_time - 1.
#[test]
fn test_deadline_is_exclusive() {
    let (mut state, mut cop) = test_ledger();
    // Created at t=100 with a 600 second window
    let auction_id = create_auction(&mut state, &mut cop, SELLER, 100, 600);
    assert_eq!(queries::get_auction(&state, auction_id).unwrap().end_time, 700);

    place_bid(&mut state, &mut cop, &LEDGER, ALICE, auction_id, 300, 699)
        .expect("Bid one second before the deadline must land");

    let late = place_bid(&mut state, &mut cop, &LEDGER, BOB, auction_id, 400, 700);
    assert!(matches!(
        late,
        Err(AuctionError::AuctionEnded { end_time: 700, .. })
    ));
    // The rejected bid left no trace
    assert_eq!(queries::get_auction(&state, auction_id).unwrap().bid_count, 1);

    let early = apply(
        &mut state,
        &mut cop,
        &ctx(BOB, 699),
        AuctionCall::FinalizeAuction { auction_id },
    );
    assert!(matches!(early, Err(AuctionError::AuctionStillActive { .. })));

    apply(
        &mut state,
        &mut cop,
        &ctx(BOB, 700),
        AuctionCall::FinalizeAuction { auction_id },
    )
    .expect("Finalize at the deadline must succeed");

    let again = apply(
        &mut state,
        &mut cop,
        &ctx(BOB, 701),
        AuctionCall::FinalizeAuction { auction_id },
    );
    assert!(matches!(again, Err(AuctionError::AuctionAlreadyFinalized(_))));

    let after_close = place_bid(&mut state, &mut cop, &LEDGER, BOB, auction_id, 400, 701);
    assert!(matches!(
        after_close,
        Err(AuctionError::AuctionAlreadyFinalized(_))
    ));
}

/// A finalized auction that drew no bids reveals the starting price and
/// the zero identity.
#[test]
fn test_unbid_auction_reveals_starting_price() {
    let (mut state, mut cop) = test_ledger();
    let auction_id = create_auction(&mut state, &mut cop, SELLER, 750, 60);

    apply(
        &mut state,
        &mut cop,
        &ctx(OUTSIDER, 160),
        AuctionCall::FinalizeAuction { auction_id },
    )
    .expect("Failed to finalize");

    assert!(queries::is_result_public(&state, &cop, auction_id).unwrap());
    let bid = queries::get_encrypted_highest_bid(&state, auction_id).unwrap();
    let bidder = queries::get_encrypted_highest_bidder(&state, auction_id).unwrap();
    assert_eq!(cop.decrypt_u64(&bid, &OUTSIDER).unwrap(), 750);
    assert_eq!(cop.decrypt_address(&bidder, &OUTSIDER).unwrap(), ZERO_ADDRESS);
}

/// Equal bids do not displace the incumbent: first to reach the maximum
/// keeps it.
#[test]
fn test_equal_bids_keep_first_reacher() {
    let (mut state, mut cop) = test_ledger();
    let auction_id = create_auction(&mut state, &mut cop, SELLER, 100, 3600);

    place_bid(&mut state, &mut cop, &LEDGER, ALICE, auction_id, 500, 200).unwrap();
    place_bid(&mut state, &mut cop, &LEDGER, BOB, auction_id, 500, 300).unwrap();

    apply(
        &mut state,
        &mut cop,
        &ctx(OUTSIDER, 3700),
        AuctionCall::FinalizeAuction { auction_id },
    )
    .expect("Failed to finalize");

    let bid = queries::get_encrypted_highest_bid(&state, auction_id).unwrap();
    let bidder = queries::get_encrypted_highest_bidder(&state, auction_id).unwrap();
    assert_eq!(cop.decrypt_u64(&bid, &OUTSIDER).unwrap(), 500);
    assert_eq!(cop.decrypt_address(&bidder, &OUTSIDER).unwrap(), ALICE);
}

/// A bid sealed against another deployment's identity is rejected with
/// no effect on the record.
#[test]
fn test_bid_sealed_for_another_deployment_rejected() {
    let (mut state, mut cop) = test_ledger();
    let auction_id = create_auction(&mut state, &mut cop, SELLER, 100, 3600);

    let foreign = LedgerId([200u8; 32]);
    let prepared = seal_bid(&foreign, &ALICE, 400, &mut OsRng);
    let result = apply(
        &mut state,
        &mut cop,
        &ctx(ALICE, 200),
        AuctionCall::PlaceBid {
            auction_id,
            ciphertext: prepared.ciphertext,
            proof: prepared.proof,
        },
    );

    assert!(matches!(
        result,
        Err(AuctionError::Coprocessor(
            CoprocessorError::InvalidInputProof
        ))
    ));
    assert_eq!(queries::get_auction(&state, auction_id).unwrap().bid_count, 0);
}

/// Winning and losing bids leave structurally identical notifications.
#[test]
fn test_bid_events_do_not_reveal_outcome() {
    let (mut state, mut cop) = test_ledger();
    let auction_id = create_auction(&mut state, &mut cop, SELLER, 100, 3600);

    // Alice leads, Bob loses; the log must not say which is which
    place_bid(&mut state, &mut cop, &LEDGER, ALICE, auction_id, 300, 200).unwrap();
    place_bid(&mut state, &mut cop, &LEDGER, BOB, auction_id, 150, 300).unwrap();

    let events = queries::get_events(&state, Some(auction_id));
    assert_eq!(events.len(), 3);
    assert!(matches!(
        events[1],
        AuctionEvent::BidPlaced { id, bidder } if id == auction_id && bidder == ALICE
    ));
    assert!(matches!(
        events[2],
        AuctionEvent::BidPlaced { id, bidder } if id == auction_id && bidder == BOB
    ));
}

/// Handles the ledger never persisted stop working in the next
/// transaction, while the persisted maximum stays usable.
#[test]
fn test_ungranted_handles_expire_between_transactions() {
    let (mut state, mut cop) = test_ledger();
    let auction_id = create_auction(&mut state, &mut cop, SELLER, 100, 3600);

    let prepared = seal_bid(&LEDGER, &ALICE, 500, &mut OsRng);
    let imported = cop
        .import_euint64(&prepared.ciphertext, &prepared.proof, &LEDGER, &ALICE)
        .unwrap();
    cop.next_transaction();

    let stored = queries::get_encrypted_highest_bid(&state, auction_id).unwrap();
    assert!(matches!(
        cop.gt(&imported, &stored),
        Err(CoprocessorError::HandleNotUsable(_))
    ));
    // The stored handle carries an internal-use grant and still computes
    assert!(cop.gt(&stored, &stored).is_ok());
}

/// A short auction end to end: one sealed bid, deadline, public reveal.
#[test]
fn test_short_auction_end_to_end() {
    let (mut state, mut cop) = test_ledger();
    let auction_id = create_auction(&mut state, &mut cop, SELLER, 1000, 10);
    assert_eq!(queries::get_auction(&state, auction_id).unwrap().end_time, 110);

    place_bid(&mut state, &mut cop, &LEDGER, ALICE, auction_id, 5000, 105)
        .expect("Failed to place bid");

    apply(
        &mut state,
        &mut cop,
        &ctx(OUTSIDER, 110),
        AuctionCall::FinalizeAuction { auction_id },
    )
    .expect("Failed to finalize");

    let bid = queries::get_encrypted_highest_bid(&state, auction_id).unwrap();
    let bidder = queries::get_encrypted_highest_bidder(&state, auction_id).unwrap();
    assert_eq!(cop.decrypt_u64(&bid, &OUTSIDER).unwrap(), 5000);
    assert_eq!(cop.decrypt_address(&bidder, &OUTSIDER).unwrap(), ALICE);

    let straggler = place_bid(&mut state, &mut cop, &LEDGER, BOB, auction_id, 9999, 200);
    assert!(matches!(
        straggler,
        Err(AuctionError::AuctionAlreadyFinalized(_))
    ));

    println!("Short auction settled: 5000 to the only bidder");
}

// Helper functions

const SELLER: Address = [1u8; 32];
const ALICE: Address = [2u8; 32];
const BOB: Address = [3u8; 32];
const CAROL: Address = [4u8; 32];
const OUTSIDER: Address = [9u8; 32];

const LEDGER: LedgerId = LedgerId([77u8; 32]);

fn ctx(sender: Address, timestamp: u64) -> CallContext {
    CallContext {
        sender,
        block_height: 1,
        timestamp,
    }
}

/// Apply one call, then close the coprocessor transaction scope the way
/// a host chain would.
fn apply(
    state: &mut LedgerState,
    cop: &mut MockCoprocessor,
    ctx: &CallContext,
    call: AuctionCall,
) -> Result<CallOutcome, AuctionError> {
    let outcome = apply_call(state, cop, ctx, call);
    cop.next_transaction();
    outcome
}

fn test_ledger() -> (LedgerState, MockCoprocessor) {
    (
        LedgerState::new(LedgerConfig::with_ledger_id(LEDGER)),
        MockCoprocessor::new(),
    )
}

/// Create an auction at t=100 and return its id.
fn create_auction(
    state: &mut LedgerState,
    cop: &mut MockCoprocessor,
    seller: Address,
    starting_price: u64,
    duration: u64,
) -> u64 {
    let outcome = apply(
        state,
        cop,
        &ctx(seller, 100),
        AuctionCall::CreateAuction {
            title: "Test auction".to_string(),
            description: String::new(),
            starting_price,
            duration,
        },
    )
    .expect("Failed to create auction");
    match outcome {
        CallOutcome::AuctionCreated(id) => id,
        other => panic!("Unexpected outcome: {:?}", other),
    }
}

/// Seal a bid with the client SDK and submit it as `bidder`.
fn place_bid(
    state: &mut LedgerState,
    cop: &mut MockCoprocessor,
    ledger_id: &LedgerId,
    bidder: Address,
    auction_id: u64,
    amount: u64,
    timestamp: u64,
) -> Result<CallOutcome, AuctionError> {
    let prepared = seal_bid(ledger_id, &bidder, amount, &mut OsRng);
    apply(
        state,
        cop,
        &ctx(bidder, timestamp),
        AuctionCall::PlaceBid {
            auction_id,
            ciphertext: prepared.ciphertext,
            proof: prepared.proof,
        },
    )
}
