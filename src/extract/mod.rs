use crate::payload::{first_truthy, is_truthy, RawMessage};
use serde_json::{Map, Value};

#[cfg(test)]
mod tests;

/// Keys the fallback search accepts as message text
const TEXT_KEYS: [&str; 3] = ["text", "message_text", "body"];

/// Nesting limit for the fallback search. Deeper structures are not visited.
pub const MAX_SEARCH_DEPTH: usize = 64;

/// Fields pulled out of one raw message. Missing values are empty strings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedFields<'a> {
    pub sender_id: String,
    pub sender_username: String,
    pub message_id: String,
    pub text: String,
    /// Unconverted timestamp, see `timestamp::normalize`
    pub raw_timestamp: Option<&'a Value>,
}

/// Extract the flat fields from a raw message and its change context.
///
/// Each field tries its known locations in order and takes the first truthy
/// one. Text falls back to a depth-first search of the whole message.
pub fn extract<'a>(
    message: RawMessage<'a>,
    context: Option<&'a Map<String, Value>>,
) -> ExtractedFields<'a> {
    let sender = message.get("sender");
    let from = message.get("from");
    let nested = message.get("message");

    let sender_id = render(first_truthy(&[field(sender, "id"), field(from, "id")]));
    let sender_username = render(first_truthy(&[
        field(sender, "username"),
        field(from, "username"),
    ]));
    let message_id = render(first_truthy(&[
        message.get("id"),
        message.get("mid"),
        field(nested, "mid"),
    ]));
    let mut text = render(first_truthy(&[message.get("text"), field(nested, "text")]));
    let raw_timestamp = first_truthy(&[
        message.get("timestamp"),
        message.get("created_time"),
        context.and_then(|c| c.get("timestamp")),
    ]);

    if text.is_empty() {
        text = search_text(message).unwrap_or_default();
    }

    ExtractedFields {
        sender_id,
        sender_username,
        message_id,
        text,
        raw_timestamp,
    }
}

/// `parent.key` when `parent` is an object
fn field<'a>(parent: Option<&'a Value>, key: &str) -> Option<&'a Value> {
    parent.and_then(Value::as_object).and_then(|map| map.get(key))
}

/// Render a scalar as a column value. Containers never render.
pub fn render(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// One container being walked by the fallback search
enum Frame<'a> {
    Map(serde_json::map::Iter<'a>),
    List(std::slice::Iter<'a, Value>),
}

impl<'a> Frame<'a> {
    fn for_value(value: &'a Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Frame::Map(map.iter())),
            Value::Array(items) => Some(Frame::List(items.iter())),
            _ => None,
        }
    }
}

/// Pre-order search for the first text-like key.
///
/// Keys are visited in document order and each value is searched completely
/// before its next sibling. The first matching key with a scalar or null value
/// ends the search of its mapping: a truthy value is the result, an empty one
/// lets the enclosing containers continue with their later siblings. A
/// matching key holding a container is searched like any other value.
///
/// Uses an explicit stack so hostile nesting cannot exhaust the thread stack.
fn search_text(message: RawMessage<'_>) -> Option<String> {
    let mut stack: Vec<Frame<'_>> = Vec::new();
    match message {
        RawMessage::Object(map) => stack.push(Frame::Map(map.iter())),
        RawMessage::Opaque(value) => stack.extend(Frame::for_value(value)),
    }

    while let Some(frame) = stack.last_mut() {
        let child = match frame {
            Frame::Map(entries) => match entries.next() {
                Some((key, value))
                    if TEXT_KEYS.contains(&key.as_str())
                        && !value.is_object()
                        && !value.is_array() =>
                {
                    if is_truthy(value) {
                        return Some(render(Some(value)));
                    }
                    stack.pop();
                    continue;
                }
                Some((_, value)) => value,
                None => {
                    stack.pop();
                    continue;
                }
            },
            Frame::List(items) => match items.next() {
                Some(value) => value,
                None => {
                    stack.pop();
                    continue;
                }
            },
        };

        if stack.len() < MAX_SEARCH_DEPTH {
            stack.extend(Frame::for_value(child));
        }
    }

    None
}
