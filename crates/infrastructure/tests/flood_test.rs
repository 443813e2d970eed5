use dnswatch_domain::{DecodeError, DecoderEvent, Direction, Transport};

mod helpers;
use helpers::*;

fn request(tx_id: u16) -> Vec<u8> {
    MessageBuilder::query(tx_id).question("flood.example", 1).build()
}

#[test]
fn test_flood_raised_exactly_once_at_threshold() {
    let threshold = 5;
    let ctx = context(threshold, 0, 0);
    let mut state = ctx.alloc_state(Transport::Udp);

    for tx_id in 0..threshold as u16 + 1 {
        state.parse_request(&request(tx_id));
        let expected = usize::from(tx_id + 1 >= threshold as u16);
        assert_eq!(
            state.events().count(DecoderEvent::Flooded),
            expected,
            "after request {}",
            tx_id + 1
        );
    }

    assert!(state.given_up());
    assert_eq!(state.unreplied(), threshold);
}

#[test]
fn test_flooded_flow_stops_tracking_and_marks_lost() {
    let ctx = context(3, 0, 0);
    let mut state = ctx.alloc_state(Transport::Udp);

    for tx_id in 0..3 {
        state.parse_request(&request(tx_id));
    }
    let memory = state.memory_in_use();

    let outcome = state.parse_request(&request(99));
    assert_eq!(outcome.error, Some(DecodeError::Flooded(3)));
    assert_eq!(outcome.tx, None);
    assert_eq!(state.live_tx_count(), 3);
    assert_eq!(state.memory_in_use(), memory);

    for tx in state.transactions() {
        assert!(tx.reply_lost());
        assert_eq!(tx.progress(Direction::ToClient), 1);
    }
}

#[test]
fn test_flood_clears_when_replies_arrive() {
    let ctx = context(3, 0, 0);
    let mut state = ctx.alloc_state(Transport::Udp);
    for tx_id in 0..3 {
        state.parse_request(&request(tx_id));
    }
    assert!(state.given_up());

    let response = MessageBuilder::response(0)
        .question("flood.example", 1)
        .build();
    state.parse_response(&response);

    assert!(!state.given_up());
    assert_eq!(state.unreplied(), 2);

    let outcome = state.parse_request(&request(10));
    assert!(outcome.is_ok());
    assert_eq!(outcome.tx, Some(4));
    assert_eq!(state.events().count(DecoderEvent::Flooded), 2);
}

#[test]
fn test_freeing_lost_transactions_ends_flood() {
    let ctx = context(2, 0, 0);
    let mut state = ctx.alloc_state(Transport::Udp);
    state.parse_request(&request(1));
    state.parse_request(&request(2));
    assert!(state.given_up());

    assert!(state.tx_free(1));
    assert!(!state.given_up());
    assert_eq!(state.unreplied(), 1);
}

#[test]
fn test_zero_threshold_disables_flood() {
    let ctx = context(0, 0, 0);
    let mut state = ctx.alloc_state(Transport::Udp);

    for tx_id in 0..600u16 {
        state.parse_request(&request(tx_id));
    }

    assert!(!state.given_up());
    assert!(!state.events().contains(DecoderEvent::Flooded));
    assert_eq!(state.unreplied(), 600);
}

#[test]
fn test_threshold_change_applies_to_existing_flows() {
    let ctx = context(100, 0, 0);
    let mut state = ctx.alloc_state(Transport::Udp);
    state.parse_request(&request(1));

    ctx.set_request_flood(2);
    state.parse_request(&request(2));

    assert!(state.given_up());
    assert_eq!(state.events().count(DecoderEvent::Flooded), 1);
}
