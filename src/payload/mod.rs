use serde::Serialize;
use serde_json::{Map, Value};


/// A raw message as found in a webhook payload.
///
/// Platform variants put objects in message slots; anything else that shows up
/// there is carried as `Opaque` so it still produces a record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RawMessage<'a> {
    Object(&'a Map<String, Value>),
    Opaque(&'a Value),
}

impl<'a> RawMessage<'a> {
    fn from_value(value: &'a Value) -> Self {
        match value {
            Value::Object(map) => RawMessage::Object(map),
            other => RawMessage::Opaque(other),
        }
    }

    /// Direct field lookup (always `None` for opaque messages)
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        match *self {
            RawMessage::Object(map) => map.get(key),
            RawMessage::Opaque(_) => None,
        }
    }
}

/// One message discovered in a payload, with the account it arrived for and
/// the change value it was found in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Discovered<'a> {
    pub page_id: Option<&'a Value>,
    pub message: RawMessage<'a>,
    /// `None` for entry-level messaging events
    pub context: Option<&'a Map<String, Value>>,
}

/// Borrowed view over a webhook body.
#[derive(Debug, Clone, Copy)]
pub struct WebhookPayload<'a> {
    body: &'a Map<String, Value>,
}

impl<'a> WebhookPayload<'a> {
    /// Wrap a parsed body. Returns `None` unless it is a non-empty JSON object.
    pub fn from_value(value: &'a Value) -> Option<Self> {
        match value {
            Value::Object(body) if !body.is_empty() => Some(Self { body }),
            _ => None,
        }
    }

    /// Top-level `object` field (e.g. "page", "instagram")
    pub fn object_type(&self) -> Option<&'a str> {
        self.body.get("object").and_then(Value::as_str)
    }

    /// Entries in document order. Non-object entries are skipped.
    pub fn entries(&self) -> impl Iterator<Item = Entry<'a>> + 'a {
        array_items(self.body.get("entry"))
            .iter()
            .filter_map(Value::as_object)
            .map(|fields| Entry { fields })
    }

    /// Walk every entry and collect raw messages in discovery order.
    ///
    /// Never fails: absent or malformed structures contribute nothing. The same
    /// entry may yield messages through several paths; they are not deduplicated.
    pub fn discover(&self) -> Vec<Discovered<'a>> {
        let mut found = Vec::new();
        for entry in self.entries() {
            entry.discover_into(&mut found);
        }
        found
    }
}

/// One account-scoped entry.
#[derive(Debug, Clone, Copy)]
pub struct Entry<'a> {
    fields: &'a Map<String, Value>,
}

impl<'a> Entry<'a> {
    pub fn page_id(&self) -> Option<&'a Value> {
        self.fields.get("id")
    }

    pub fn changes(&self) -> impl Iterator<Item = Change<'a>> + 'a {
        array_items(self.fields.get("changes"))
            .iter()
            .filter_map(Value::as_object)
            .map(|fields| Change { fields })
    }

    /// Entry-level `messaging`, falling back to `messaging_events`
    pub fn messaging(&self) -> &'a [Value] {
        array_items(first_truthy(&[
            self.fields.get("messaging"),
            self.fields.get("messaging_events"),
        ]))
    }

    fn discover_into(&self, found: &mut Vec<Discovered<'a>>) {
        let page_id = self.page_id();

        for change in self.changes() {
            let Some(value) = change.value() else {
                continue;
            };
            let push = |found: &mut Vec<Discovered<'a>>, message: &'a Value| {
                found.push(Discovered {
                    page_id,
                    message: RawMessage::from_value(message),
                    context: Some(value),
                });
            };

            match first_truthy(&[value.get("messages"), value.get("message")]) {
                Some(Value::Array(messages)) => {
                    for message in messages {
                        push(found, message);
                    }
                }
                Some(message) if message.is_object() => push(found, message),
                _ => {}
            }

            for message in array_items(value.get("messaging")) {
                push(found, message);
            }
        }

        for message in self.messaging() {
            found.push(Discovered {
                page_id,
                message: RawMessage::from_value(message),
                context: None,
            });
        }
    }
}

/// One change notification within an entry.
#[derive(Debug, Clone, Copy)]
pub struct Change<'a> {
    fields: &'a Map<String, Value>,
}

impl<'a> Change<'a> {
    /// The change's `value` object, if it is one
    pub fn value(&self) -> Option<&'a Map<String, Value>> {
        self.fields.get("value").and_then(Value::as_object)
    }
}

/// Platform payloads treat empty values as missing.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// First candidate that is present and truthy.
pub(crate) fn first_truthy<'a>(candidates: &[Option<&'a Value>]) -> Option<&'a Value> {
    candidates.iter().flatten().copied().find(|v| is_truthy(v))
}

fn array_items(value: Option<&Value>) -> &[Value] {
    match value {
        Some(Value::Array(items)) => items.as_slice(),
        _ => &[],
    }
}
