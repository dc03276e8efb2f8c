use crate::extract::{extract, render};
use crate::payload::{Discovered, RawMessage, WebhookPayload};
use crate::timestamp;
use serde::Serialize;
use serde_json::{Map, Value};

/// Log columns, in row order
pub const COLUMNS: [&str; 8] = [
    "received_at",
    "page_id",
    "sender_id",
    "sender_username",
    "message_id",
    "message_text",
    "timestamp",
    "raw_json",
];

/// One flat log row per raw message.
///
/// Built per request and written straight to the message log; never cached.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedRecord {
    /// Canonical time the record was built
    pub received_at: String,
    pub page_id: String,
    pub sender_id: String,
    pub sender_username: String,
    pub message_id: String,
    pub message_text: String,
    /// Canonical event time, empty if the platform sent none we could read
    pub timestamp: String,
    /// `{"message": ..., "context": ...}` snapshot for audit replay
    pub raw_json: String,
}

/// Audit snapshot stored in the `raw_json` column
#[derive(Serialize)]
struct RawSnapshot<'a> {
    message: RawMessage<'a>,
    context: &'a Map<String, Value>,
}

impl NormalizedRecord {
    /// Build a record from one discovered message. Never fails; missing data
    /// becomes empty columns.
    pub fn build(discovered: &Discovered<'_>, received_at: String) -> Self {
        let fields = extract(discovered.message, discovered.context);

        let empty = Map::new();
        let snapshot = RawSnapshot {
            message: discovered.message,
            context: discovered.context.unwrap_or(&empty),
        };
        // JSON values with string keys always serialize
        let raw_json = serde_json::to_string(&snapshot).unwrap_or_default();

        Self {
            received_at,
            page_id: render(discovered.page_id),
            sender_id: fields.sender_id,
            sender_username: fields.sender_username,
            message_id: fields.message_id,
            message_text: fields.text,
            timestamp: timestamp::normalize(fields.raw_timestamp),
            raw_json,
        }
    }

    /// Columns in `COLUMNS` order
    pub fn as_row(&self) -> [&str; 8] {
        [
            &self.received_at,
            &self.page_id,
            &self.sender_id,
            &self.sender_username,
            &self.message_id,
            &self.message_text,
            &self.timestamp,
            &self.raw_json,
        ]
    }
}

/// Normalize every message in a payload, in discovery order.
pub fn normalize_payload(payload: &WebhookPayload<'_>) -> Vec<NormalizedRecord> {
    payload
        .discover()
        .iter()
        .map(|d| NormalizedRecord::build(d, timestamp::now_canonical()))
        .collect()
}
