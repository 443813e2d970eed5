use dnswatch_domain::{DecodeError, DecoderEvent, Direction, ResponseCode, Transport};
use dnswatch_infrastructure::dns::{DnsState, DnsTransaction};

mod helpers;
use helpers::*;

fn example_request(tx_id: u16) -> Vec<u8> {
    MessageBuilder::query(tx_id).question("example.com", 1).build()
}

#[test]
fn test_example_com_request_and_response() {
    let ctx = default_context();
    let mut state = ctx.alloc_state(Transport::Udp);

    let request = example_request(0x1234);
    let outcome = state.parse_request(&request);
    assert!(outcome.is_ok());
    assert_eq!(outcome.consumed, request.len());
    assert_eq!(outcome.tx, Some(1));

    let response = MessageBuilder::response(0x1234)
        .question("example.com", 1)
        .answer("example.com", 1, 300, &[93, 184, 216, 34])
        .build();
    let outcome = state.parse_response(&response);
    assert!(outcome.is_ok());
    assert_eq!(outcome.consumed, response.len());

    assert_eq!(state.live_tx_count(), 1);
    let tx = state.tx_get(1).unwrap();
    assert_eq!(tx.tx_id(), 0x1234);
    assert!(tx.replied());
    assert_eq!(tx.response_code(), Some(ResponseCode::NoError));
    assert_eq!(tx.queries().len(), 1);
    assert_eq!(tx.queries()[0].name.as_ref(), b"example.com");
    assert_eq!(tx.answers().len(), 1);

    let answer = &tx.answers()[0];
    assert_eq!(answer.name_lossy(), "example.com");
    assert_eq!(answer.type_string(), "A");
    assert_eq!(answer.ttl, 300);
    assert_eq!(answer.data.as_ref(), &[93, 184, 216, 34]);

    assert_eq!(state.unreplied(), 0);
    assert!(!state.has_events());
}

#[test]
fn test_response_copies_rcode_and_recursion_desired() {
    let ctx = default_context();
    let mut state = ctx.alloc_state(Transport::Udp);

    state.parse_request(&example_request(0x0042));
    let response = MessageBuilder::response(0x0042)
        .flags(FLAG_RESPONSE)
        .rcode(3)
        .question("example.com", 1)
        .build();
    state.parse_response(&response);

    let tx = state.tx_get(1).unwrap();
    assert!(tx.replied());
    assert_eq!(tx.rcode(), 3);
    assert_eq!(tx.response_code(), Some(ResponseCode::NxDomain));
    assert!(!tx.recursion_desired());
}

#[test]
fn test_duplicate_wire_ids_match_oldest_first() {
    let ctx = default_context();
    let mut state = ctx.alloc_state(Transport::Udp);

    state.parse_request(&example_request(7));
    state.parse_request(&example_request(7));
    assert_eq!(state.find_by_wire_id(7).map(DnsTransaction::seq), Some(1));

    let response = MessageBuilder::response(7).question("example.com", 1).build();
    assert_eq!(state.parse_response(&response).tx, Some(1));
    assert_eq!(state.find_by_wire_id(7).map(DnsTransaction::seq), Some(2));
    assert_eq!(state.parse_response(&response).tx, Some(2));

    assert!(state.find_by_wire_id(7).is_none());
    assert_eq!(state.unreplied(), 0);
}

#[test]
fn test_unsolicited_response_is_discarded() {
    let ctx = default_context();
    let mut state = ctx.alloc_state(Transport::Udp);
    state.parse_request(&example_request(1));

    let response = MessageBuilder::response(2)
        .question("example.com", 1)
        .answer("example.com", 1, 60, &[192, 0, 2, 1])
        .build();
    let outcome = state.parse_response(&response);

    assert_eq!(outcome.error, Some(DecodeError::UnsolicitedResponse(2)));
    assert_eq!(outcome.tx, None);
    assert_eq!(state.events().count(DecoderEvent::UnsolicitedResponse), 1);
    assert_eq!(state.events().len(), 1);
    assert_eq!(state.unreplied(), 1);
    assert_eq!(state.live_tx_count(), 1);
    assert!(!state.tx_get(1).unwrap().replied());
}

#[test]
fn test_query_flag_on_request_is_flagged_but_parsed() {
    let ctx = default_context();
    let mut state = ctx.alloc_state(Transport::Udp);

    let request = MessageBuilder::query(9)
        .flags(FLAG_RESPONSE | FLAG_Z)
        .question("example.org", 28)
        .build();
    let outcome = state.parse_request(&request);

    assert!(outcome.is_ok());
    let tx = state.tx_get(1).unwrap();
    assert_eq!(tx.queries().len(), 1);
    assert!(tx.events().contains(DecoderEvent::NotARequest));
    assert!(tx.events().contains(DecoderEvent::ZFlagSet));
}

#[test]
fn test_unsupported_opcode_is_not_a_request() {
    let ctx = default_context();
    let mut state = ctx.alloc_state(Transport::Udp);

    // opcode 3 is unassigned
    let request = MessageBuilder::query(9)
        .flags(3 << 11)
        .question("example.org", 1)
        .build();
    state.parse_request(&request);

    assert!(state
        .tx_events(1)
        .unwrap()
        .contains(DecoderEvent::NotARequest));
}

#[test]
fn test_response_without_qr_raises_not_a_response() {
    let ctx = default_context();
    let mut state = ctx.alloc_state(Transport::Udp);
    state.parse_request(&example_request(5));

    let response = MessageBuilder::query(5).question("example.com", 1).build();
    state.parse_response(&response);

    let tx = state.tx_get(1).unwrap();
    assert!(tx.replied());
    assert!(tx.events().contains(DecoderEvent::NotAResponse));
}

#[test]
fn test_truncated_answer_is_malformed_and_flow_survives() {
    let ctx = default_context();
    let mut state = ctx.alloc_state(Transport::Udp);
    state.parse_request(&example_request(1));

    let mut response = MessageBuilder::response(1)
        .question("example.com", 1)
        .answer("example.com", 1, 60, &[192, 0, 2, 1])
        .build();
    response.truncate(response.len() - 2);

    let outcome = state.parse_response(&response);
    assert!(matches!(outcome.error, Some(DecodeError::MalformedData(_))));
    assert_eq!(outcome.tx, Some(1));
    assert!(state.events().contains(DecoderEvent::MalformedData));
    assert!(state.tx_get(1).unwrap().answers().is_empty());

    let outcome = state.parse_request(&example_request(2));
    assert!(outcome.is_ok());
    assert_eq!(outcome.tx, Some(2));
}

#[test]
fn test_authority_and_additional_sections() {
    let ctx = default_context();
    let mut state = ctx.alloc_state(Transport::Udp);
    state.parse_request(&example_request(1));

    let response = MessageBuilder::response(1)
        .rcode(3)
        .question("example.com", 1)
        .authority("example.com", 2, 3600, &encode_name("ns1.example.com"))
        .additional("ns1.example.com", 1, 3600, &[192, 0, 2, 53])
        .build();
    let outcome = state.parse_response(&response);
    assert!(outcome.is_ok());
    assert_eq!(outcome.consumed, response.len());

    let tx = state.tx_get(1).unwrap();
    assert!(tx.answers().is_empty());
    assert_eq!(tx.authorities().len(), 1);
    assert_eq!(tx.authorities()[0].data.as_ref(), b"ns1.example.com");
}

#[test]
fn test_mx_payload_is_exchange_name() {
    let ctx = default_context();
    let mut state = ctx.alloc_state(Transport::Udp);
    state.parse_request(&MessageBuilder::query(1).question("example.com", 15).build());

    let mut rdata = vec![0x00, 0x0A];
    rdata.extend_from_slice(&encode_name("mail.example.com"));
    let response = MessageBuilder::response(1)
        .question("example.com", 15)
        .answer("example.com", 15, 300, &rdata)
        .build();
    state.parse_response(&response);

    let answer = &state.tx_get(1).unwrap().answers()[0];
    assert_eq!(answer.type_string(), "MX");
    assert_eq!(answer.data.as_ref(), b"mail.example.com");
}

#[test]
fn test_tx_free_credits_memory_and_keeps_sequence() {
    let ctx = default_context();
    let mut state = ctx.alloc_state(Transport::Udp);

    state.parse_request(&example_request(1));
    let charged = state.tx_get(1).unwrap().charged();
    assert_eq!(state.memory_in_use(), charged);
    assert_eq!(ctx.memcap().memuse(), charged);

    assert!(state.tx_free(1));
    assert!(!state.tx_free(1));
    assert_eq!(state.memory_in_use(), 0);
    assert_eq!(ctx.memcap().memuse(), 0);
    assert_eq!(state.unreplied(), 0);
    assert!(state.curr().is_none());

    let outcome = state.parse_request(&example_request(1));
    assert_eq!(outcome.tx, Some(2));
    assert_eq!(state.tx_count(), 2);
}

#[test]
fn test_progress_reports_completion() {
    let ctx = default_context();
    let mut state = ctx.alloc_state(Transport::Udp);
    state.parse_request(&example_request(3));

    let done = DnsState::progress_completion_status(Direction::ToClient);
    assert_eq!(state.tx_progress(1, Direction::ToServer), Some(1));
    assert_ne!(state.tx_progress(1, Direction::ToClient), Some(done));

    state.parse_response(&MessageBuilder::response(3).question("example.com", 1).build());
    assert_eq!(state.tx_progress(1, Direction::ToClient), Some(done));
    assert_eq!(state.tx_progress(99, Direction::ToClient), None);
}

#[test]
fn test_parse_message_dispatches_by_direction() {
    let ctx = default_context();
    let mut state = ctx.alloc_state(Transport::Udp);

    state.parse_message(Direction::ToServer, &example_request(4));
    state.parse_message(
        Direction::ToClient,
        &MessageBuilder::response(4).question("example.com", 1).build(),
    );

    assert!(state.curr().unwrap().replied());
}
