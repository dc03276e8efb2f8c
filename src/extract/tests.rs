use super::*;
use serde_json::json;

fn object(value: &Value) -> RawMessage<'_> {
    RawMessage::Object(value.as_object().unwrap())
}

#[test]
fn test_messenger_event_fields() {
    let msg = json!({
        "sender": {"id": "u1", "username": "alice"},
        "recipient": {"id": "page"},
        "timestamp": 1700000000,
        "message": {"mid": "m1", "text": "hello"}
    });
    let fields = extract(object(&msg), None);

    assert_eq!(fields.sender_id, "u1");
    assert_eq!(fields.sender_username, "alice");
    assert_eq!(fields.message_id, "m1");
    assert_eq!(fields.text, "hello");
    assert_eq!(fields.raw_timestamp, Some(&json!(1700000000)));
}

#[test]
fn test_graph_style_message_fields() {
    let msg = json!({
        "from": {"id": 9876, "username": "bob"},
        "id": "aWdfZAG",
        "text": "direct text",
        "created_time": "1700000000"
    });
    let fields = extract(object(&msg), None);

    assert_eq!(fields.sender_id, "9876");
    assert_eq!(fields.sender_username, "bob");
    assert_eq!(fields.message_id, "aWdfZAG");
    assert_eq!(fields.text, "direct text");
    assert_eq!(fields.raw_timestamp, Some(&json!("1700000000")));
}

#[test]
fn test_sender_falls_back_to_from_when_empty() {
    let msg = json!({"sender": {"id": ""}, "from": {"id": "f1"}});
    assert_eq!(extract(object(&msg), None).sender_id, "f1");
}

#[test]
fn test_message_id_precedence() {
    let msg = json!({"id": "top", "mid": "mid", "message": {"mid": "nested"}});
    assert_eq!(extract(object(&msg), None).message_id, "top");

    let msg = json!({"mid": "mid", "message": {"mid": "nested"}});
    assert_eq!(extract(object(&msg), None).message_id, "mid");

    let msg = json!({"message": {"mid": "nested"}});
    assert_eq!(extract(object(&msg), None).message_id, "nested");
}

#[test]
fn test_timestamp_falls_back_to_context() {
    let msg = json!({"mid": "m"});
    let context = json!({"timestamp": 1700000000000i64});
    let fields = extract(object(&msg), context.as_object());
    assert_eq!(fields.raw_timestamp, Some(&json!(1700000000000i64)));

    let msg = json!({"timestamp": 0, "created_time": 1700000001});
    let fields = extract(object(&msg), context.as_object());
    assert_eq!(fields.raw_timestamp, Some(&json!(1700000001)));
}

#[test]
fn test_missing_fields_are_empty() {
    let msg = json!({"unrelated": true});
    let fields = extract(object(&msg), None);
    assert_eq!(fields, ExtractedFields::default());
}

#[test]
fn test_fallback_finds_nested_body() {
    let msg = json!({"message": {"body": "hi"}});
    assert_eq!(extract(object(&msg), None).text, "hi");
}

#[test]
fn test_fallback_accepts_message_text_key() {
    let msg = json!({"payload": [{"kind": "x"}, {"message_text": "from list"}]});
    assert_eq!(extract(object(&msg), None).text, "from list");
}

#[test]
fn test_fallback_is_pre_order() {
    // The first key's subtree is searched before its later siblings
    let msg = json!({
        "attachments": {"caption": {"text": "deep first"}},
        "body": "shallow later"
    });
    assert_eq!(extract(object(&msg), None).text, "deep first");
}

#[test]
fn test_fallback_descends_into_container_under_text_key() {
    let msg = json!({"text": {"body": "inner"}});
    assert_eq!(extract(object(&msg), None).text, "inner");
}

#[test]
fn test_fallback_first_matching_key_wins_even_when_empty() {
    let msg = json!({"text": "", "body": "later"});
    assert_eq!(extract(object(&msg), None).text, "");

    let msg = json!({"text": null, "message": {"body": "hi"}});
    assert_eq!(extract(object(&msg), None).text, "");

    let msg = json!({"payload": {"body": 0, "text": "sibling"}});
    assert_eq!(extract(object(&msg), None).text, "");
}

#[test]
fn test_fallback_empty_match_lets_outer_siblings_continue() {
    let msg = json!({"a": {"text": "", "body": "skipped"}, "b": {"body": "found"}});
    assert_eq!(extract(object(&msg), None).text, "found");

    let msg = json!({"items": [{"message_text": null}, {"message_text": "second"}]});
    assert_eq!(extract(object(&msg), None).text, "second");
}

#[test]
fn test_opaque_message_runs_fallback_only() {
    let msg = json!([{"body": "in array"}]);
    let fields = extract(RawMessage::Opaque(&msg), None);
    assert_eq!(fields.text, "in array");
    assert_eq!(fields.sender_id, "");

    let msg = json!("bare string");
    assert_eq!(extract(RawMessage::Opaque(&msg), None).text, "");
}

#[test]
fn test_fallback_depth_is_bounded() {
    let mut nested = json!({"text": "too deep"});
    for _ in 0..(MAX_SEARCH_DEPTH + 10) {
        nested = json!({"wrap": nested});
    }
    let msg = json!({"deep": nested});
    assert_eq!(extract(object(&msg), None).text, "");

    let mut shallow = json!({"text": "reachable"});
    for _ in 0..10 {
        shallow = json!({"wrap": shallow});
    }
    let msg = json!({"deep": shallow});
    assert_eq!(extract(object(&msg), None).text, "reachable");
}

#[test]
fn test_render_scalars() {
    assert_eq!(render(Some(&json!("s"))), "s");
    assert_eq!(render(Some(&json!(12))), "12");
    assert_eq!(render(Some(&json!(false))), "false");
    assert_eq!(render(Some(&json!({"id": 1}))), "");
    assert_eq!(render(Some(&json!(null))), "");
    assert_eq!(render(None), "");
}
