use super::codec::{Frame, JsonCodec, MessageCodec, RawCodec};
use super::envelope::{Message, MessageBody, MessageType, TARGET_HEADER};
use crate::utils::error::CodecError;

#[test]
fn test_new_message_has_fresh_id_and_unknown_origin() {
    let a = Message::text("hello");
    let b = Message::text("hello");
    assert!(!a.id.is_empty());
    assert_ne!(a.id, b.id);
    assert_eq!(a.from, "Unknown");
    assert!(a.headers.is_empty());
}

#[test]
fn test_message_type_matches_body() {
    assert_eq!(Message::ping(vec![]).message_type(), MessageType::Ping);
    assert_eq!(Message::pong(vec![1]).message_type(), MessageType::Pong);
    assert_eq!(Message::text("x").message_type(), MessageType::Text);
    assert_eq!(Message::binary(vec![0, 1]).message_type(), MessageType::Binary);
}

#[test]
fn test_target_header() {
    let msg = Message::text("hi").with_header(TARGET_HEADER, "c2");
    assert_eq!(msg.target(), Some("c2"));
    assert_eq!(Message::text("hi").target(), None);
}

#[test]
fn test_json_envelope_layout() {
    let mut msg = Message::text("hello").with_header(TARGET_HEADER, "c2");
    msg.id = "m-1".to_string();
    msg.from = "X".to_string();

    let bytes = JsonCodec.to_bytes(&msg).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value["id"], "m-1");
    assert_eq!(value["from"], "X");
    assert_eq!(value["headers"][TARGET_HEADER], "c2");
    assert_eq!(value["body"]["type"], "Text");
    assert_eq!(value["body"]["payload"], "hello");

    let decoded = JsonCodec.from_bytes(&bytes).unwrap();
    assert_eq!(decoded, msg);
}

#[test]
fn test_json_codec_rejects_garbage_and_control_frames() {
    assert!(matches!(
        JsonCodec.from_bytes(b"not json"),
        Err(CodecError::Json(_))
    ));
    assert!(matches!(
        JsonCodec.decode(Frame::Ping(vec![])),
        Err(CodecError::Unsupported("ping"))
    ));
}

#[test]
fn test_raw_codec_passes_payload_through() {
    let frame = RawCodec.encode(&Message::text("hello")).unwrap();
    assert_eq!(frame, Frame::Text("hello".to_string()));

    let frame = RawCodec.encode(&Message::binary(vec![1, 2, 3])).unwrap();
    assert_eq!(frame, Frame::Binary(vec![1, 2, 3]));

    let decoded = RawCodec.decode(Frame::Ping(vec![9])).unwrap();
    assert_eq!(decoded.body, MessageBody::Ping(vec![9]));
}
