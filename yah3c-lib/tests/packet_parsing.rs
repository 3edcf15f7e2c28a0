//! Tests for classifying inbound frames

mod common;

use common::*;

fn classify(frame: Bytes) -> Result<Packet, H3cError> {
    Packet::try_from(frame.slice(ETHERNET_HEADER_SIZE..))
}

#[test]
fn test_identity_request() {
    let packet = classify(request_frame(1, 0x01, b"")).expect("Failed to parse packet");
    assert_eq!(
        packet,
        Packet::Request {
            id: 1,
            request: Request::Identity
        }
    );
}

#[test]
fn test_vendor_request() {
    let packet = classify(request_frame(3, 0x07, &[0x00, 0x01])).expect("Failed to parse packet");
    assert_eq!(
        packet,
        Packet::Request {
            id: 3,
            request: Request::H3c
        }
    );
}

#[test]
fn test_md5_request_extracts_challenge() {
    let packet = classify(md5_request_frame(7, &CHALLENGE)).expect("Failed to parse packet");
    assert_eq!(
        packet,
        Packet::Request {
            id: 7,
            request: Request::Md5Challenge(Bytes::copy_from_slice(&CHALLENGE))
        }
    );
}

#[test]
fn test_md5_request_value_size_past_data() {
    // value-size says 16 but only 4 bytes follow
    let frame = request_frame(7, 0x04, &[0x10, 0x01, 0x02, 0x03, 0x04]);
    assert!(matches!(
        classify(frame),
        Err(H3cError::TruncatedPacket {
            declared: 16,
            available: 4
        })
    ));
}

#[test]
fn test_md5_request_without_data() {
    let frame = request_frame(7, 0x04, &[]);
    assert!(matches!(classify(frame), Err(H3cError::TruncatedPacket { .. })));
}

#[test]
fn test_unknown_request_type() {
    let packet = classify(request_frame(2, 0x19, b"peap")).expect("Failed to parse packet");
    assert_eq!(
        packet,
        Packet::Request {
            id: 2,
            request: Request::Unknown(0x19)
        }
    );
}

#[test]
fn test_success_failure_response() {
    assert_eq!(classify(success_frame(4)).unwrap(), Packet::Success { id: 4 });
    assert_eq!(classify(failure_frame(5)).unwrap(), Packet::Failure { id: 5 });
    let response = inbound_frame(&eap_body(0x02, 6, Some((0x01, b"x"))));
    assert_eq!(classify(response).unwrap(), Packet::Response { id: 6 });
}

#[test]
fn test_login_message_quirk() {
    // code 10, id 5; text starts at EAPOL offset 12
    let mut body = eap_body(10, 5, None);
    body.extend_from_slice(&[0xAA, 0xBB, 0xCC, 0xDD]);
    body.extend_from_slice(b"welcome");
    let packet = classify(inbound_frame(&body)).expect("Failed to parse packet");
    assert_eq!(packet, Packet::LoginMessage(Bytes::from_static(b"welcome")));
}

#[test]
fn test_login_message_decodes_gbk() {
    // "认证成功" followed by NUL padding
    let msg = hex_to_bytes("c8cfd6a4b3c9b9a60000");
    assert_eq!(decode_login_message(&msg).as_deref(), Some("认证成功"));
    assert_eq!(decode_login_message(b"welcome").as_deref(), Some("welcome"));
    assert_eq!(decode_login_message(&[]).as_deref(), Some(""));
}

#[test]
fn test_login_message_invalid_gbk() {
    assert_eq!(decode_login_message(&[0xc8, 0xcf, 0xff]), None);
}

#[test]
fn test_code_10_with_other_id_is_unknown() {
    let packet = classify(inbound_frame(&eap_body(10, 6, None))).expect("Failed to parse packet");
    assert_eq!(packet, Packet::UnknownCode { code: 10, id: 6 });
}

#[test]
fn test_non_eap_eapol_frame() {
    let packet = classify(inbound_frame(&[0x01, 0x01, 0x00, 0x00])).expect("Failed to parse packet");
    assert_eq!(packet, Packet::UnknownEapol(EapolType::Start));
}

#[test]
fn test_truncated_eap_header() {
    let result = classify(inbound_frame(&[0x01, 0x00, 0x00, 0x04, 0x03]));
    assert!(matches!(result, Err(H3cError::MalformedFrame { .. })));
}

#[test]
fn test_request_length_past_buffer() {
    let mut body = eap_body(0x01, 1, Some((0x01, b"abc")));
    body.truncate(body.len() - 2);
    let result = classify(inbound_frame(&body));
    assert!(matches!(result, Err(H3cError::TruncatedPacket { .. })));
}

#[test]
fn test_ethernet_padding_is_ignored() {
    // short frames are padded to 60 bytes on the wire
    let mut frame = request_frame(9, 0x01, b"").to_vec();
    frame.resize(60, 0);
    let packet = classify(Bytes::from(frame)).expect("Failed to parse packet");
    assert_eq!(
        packet,
        Packet::Request {
            id: 9,
            request: Request::Identity
        }
    );
}
