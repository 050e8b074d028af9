// ABOUTME: Response normalizer mapping arbitrary webhook payloads to displayable output
// ABOUTME: Walks ordered field probes over JSON shapes and routes binary bodies to image artifacts

use crate::artifact::{error_placeholder, ImageArtifact};
use crate::constants::{limits, messages};
use crate::signature::sniff_legacy_str;
use hookpad_sdk::{Payload, WebhookResponse};
use log::debug;
use serde_json::Value;

/// What the rendering surface should show for a response.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    Text(String),
    Image(ImageArtifact),
}

impl Normalized {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Normalized::Text(text) => Some(text),
            Normalized::Image(_) => None,
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, Normalized::Image(_))
    }
}

/// A named accessor into a JSON value. Tables of probes are walked in order
/// and the first present value wins.
enum Probe {
    Field(&'static str),
    Nested(&'static str, fn(&Value) -> Option<&Value>),
}

impl Probe {
    fn name(&self) -> &'static str {
        match self {
            Probe::Field(name) | Probe::Nested(name, _) => name,
        }
    }

    fn get<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        match self {
            Probe::Field(name) => value.get(name),
            Probe::Nested(_, accessor) => accessor(value),
        }
    }
}

fn first_choice(value: &Value) -> Option<&Value> {
    value.get("choices")?.as_array()?.first()
}

fn choice_message_content(value: &Value) -> Option<&Value> {
    first_choice(value)?.get("message")?.get("content")
}

fn choice_text(value: &Value) -> Option<&Value> {
    first_choice(value)?.get("text")
}

const ARRAY_ITEM_PROBES: &[Probe] = &[
    Probe::Field("output"),
    Probe::Field("response"),
    Probe::Field("text"),
    Probe::Field("content"),
];

const OBJECT_PROBES: &[Probe] = &[
    Probe::Field("output"),
    Probe::Field("response"),
    Probe::Field("message"),
    Probe::Field("text"),
    Probe::Field("content"),
    Probe::Field("result"),
    Probe::Field("data"),
    Probe::Field("generated_text"),
    Probe::Field("completion"),
    Probe::Nested("choices[0].message.content", choice_message_content),
    Probe::Nested("choices[0].text", choice_text),
];

/// Normalize a decoded payload. Never fails: every unexpected shape becomes a
/// diagnostic string.
pub fn normalize(payload: &Payload, content_type: Option<&str>) -> Normalized {
    match payload {
        Payload::Empty | Payload::Structured(Value::Null) => {
            Normalized::Text(messages::NO_RESPONSE_DATA.to_string())
        }
        Payload::Binary(bytes) => match ImageArtifact::from_bytes(bytes.clone(), content_type) {
            Ok(artifact) => Normalized::Image(artifact),
            Err(err) => Normalized::Text(error_placeholder(&err)),
        },
        Payload::Text(text) | Payload::Structured(Value::String(text)) => {
            Normalized::Text(normalize_text(text))
        }
        Payload::Structured(Value::Array(items)) => Normalized::Text(normalize_array(items)),
        Payload::Structured(value @ Value::Object(_)) => Normalized::Text(normalize_object(value)),
        Payload::Structured(Value::Bool(_)) => Normalized::Text(unexpected("boolean")),
        Payload::Structured(Value::Number(_)) => Normalized::Text(unexpected("number")),
    }
}

/// Normalize a full webhook response using its declared content type.
pub fn normalize_response(response: &WebhookResponse) -> Normalized {
    normalize(&response.payload, response.content_type.as_deref())
}

fn normalize_text(text: &str) -> String {
    if let Some(first) = text.chars().next() {
        if (first as u32) < 0x20 && first != '\n' && first != '\r' {
            return messages::BINARY_TEXT.to_string();
        }
    }

    if sniff_legacy_str(text).is_some() {
        return messages::IMAGE_TEXT.to_string();
    }

    text.to_string()
}

fn normalize_array(items: &[Value]) -> String {
    let Some(first) = items.first() else {
        return unexpected("empty array");
    };

    if first.is_object() {
        if let Some(found) = probe(first, ARRAY_ITEM_PROBES) {
            return found;
        }
    }

    match first {
        Value::String(text) => text.clone(),
        other => pretty(other),
    }
}

fn normalize_object(value: &Value) -> String {
    let keys: Vec<&str> = value
        .as_object()
        .map(|map| map.keys().map(String::as_str).collect())
        .unwrap_or_default();
    debug!("response object keys: {:?}", keys);

    if let Some(found) = probe(value, OBJECT_PROBES) {
        return found;
    }

    let listed = keys
        .iter()
        .take(limits::MAX_LISTED_KEYS)
        .copied()
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Response object found with keys: {}. Please check which key contains your content.",
        listed
    )
}

fn probe(value: &Value, probes: &[Probe]) -> Option<String> {
    probes.iter().find_map(|probe| {
        let found = probe.get(value).filter(|v| is_present(v))?;
        debug!("response content found under '{}'", probe.name());
        Some(render(found))
    })
}

/// Null, `false`, zero, and the empty string count as absent.
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(text) => !text.is_empty(),
        Value::Number(n) => n.as_f64() != Some(0.0),
        _ => true,
    }
}

/// Present strings are returned verbatim; anything else is shown as JSON.
fn render(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Array(_) | Value::Object(_) => pretty(value),
        scalar => scalar.to_string(),
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|err| format!("Error parsing response: {}", err))
}

fn unexpected(kind: &str) -> String {
    format!("Unexpected response type: {}", kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text_of(payload: Payload) -> String {
        match normalize(&payload, None) {
            Normalized::Text(text) => text,
            Normalized::Image(_) => panic!("expected text"),
        }
    }

    #[test]
    fn test_empty_and_null() {
        assert_eq!(text_of(Payload::Empty), "No response data received");
        assert_eq!(
            text_of(Payload::Structured(Value::Null)),
            "No response data received"
        );
    }

    #[test]
    fn test_plain_text_verbatim() {
        assert_eq!(text_of(Payload::Text("hello\nworld".into())), "hello\nworld");
        assert_eq!(text_of(Payload::Text("\nleading newline".into())), "\nleading newline");
        assert_eq!(text_of(Payload::Text(String::new())), "");
    }

    #[test]
    fn test_control_character_prefix() {
        assert_eq!(
            text_of(Payload::Text("\u{0}\u{1}abc".into())),
            messages::BINARY_TEXT
        );
        assert_eq!(text_of(Payload::Text("\tindented".into())), messages::BINARY_TEXT);
    }

    #[test]
    fn test_legacy_signature_prefix() {
        assert_eq!(
            text_of(Payload::Text("\u{89}PNG\r\n\u{1a}\n".into())),
            messages::IMAGE_TEXT
        );
        assert_eq!(text_of(Payload::Text("GIF89a...".into())), messages::IMAGE_TEXT);
        assert_eq!(text_of(Payload::Text("RIFF....WEBP".into())), messages::IMAGE_TEXT);
    }

    #[test]
    fn test_structured_string() {
        assert_eq!(text_of(Payload::Structured(json!("just text"))), "just text");
    }

    #[test]
    fn test_object_probe_order() {
        let payload = Payload::Structured(json!({
            "text": "from text",
            "message": "from message",
            "output": "from output"
        }));
        assert_eq!(text_of(payload), "from output");

        let payload = Payload::Structured(json!({"completion": "c", "data": "d"}));
        assert_eq!(text_of(payload), "d");
    }

    #[test]
    fn test_null_field_is_skipped() {
        let payload = Payload::Structured(json!({"output": null, "response": "r"}));
        assert_eq!(text_of(payload), "r");

        let payload = Payload::Structured(json!({"output": "", "response": "r"}));
        assert_eq!(text_of(payload), "r");

        let payload = Payload::Structured(json!({"output": false, "text": 0, "data": 0.0, "completion": "c"}));
        assert_eq!(text_of(payload), "c");

        let payload = Payload::Structured(json!({"choices": [{"message": {"content": ""}, "text": "t"}]}));
        assert_eq!(text_of(payload), "t");

        assert_eq!(
            text_of(Payload::Structured(json!([{"output": "", "content": "c"}]))),
            "c"
        );
    }

    #[test]
    fn test_falsy_only_fields_list_keys() {
        let payload = Payload::Structured(json!({"output": "", "result": 0}));
        assert_eq!(
            text_of(payload),
            "Response object found with keys: output, result. Please check which key contains your content."
        );
    }

    #[test]
    fn test_non_string_field_rendered_as_json() {
        let payload = Payload::Structured(json!({"result": {"a": 1}}));
        assert_eq!(text_of(payload), "{\n  \"a\": 1\n}");

        let payload = Payload::Structured(json!({"data": 42}));
        assert_eq!(text_of(payload), "42");
    }

    #[test]
    fn test_openai_shapes() {
        let payload = Payload::Structured(json!({"choices": [{"message": {"content": "hi"}}]}));
        assert_eq!(text_of(payload), "hi");

        let payload = Payload::Structured(json!({"choices": [{"text": "legacy"}]}));
        assert_eq!(text_of(payload), "legacy");
    }

    #[test]
    fn test_choices_must_be_array() {
        let payload = Payload::Structured(json!({"choices": {"0": {"text": "nope"}}}));
        assert!(text_of(payload).starts_with("Response object found with keys: choices."));
    }

    #[test]
    fn test_unrecognized_object_lists_five_keys() {
        let payload = Payload::Structured(json!({
            "a": 1, "b": 2, "c": 3, "d": 4, "e": 5, "f": 6, "g": 7
        }));
        assert_eq!(
            text_of(payload),
            "Response object found with keys: a, b, c, d, e. Please check which key contains your content."
        );
    }

    #[test]
    fn test_array_shapes() {
        assert_eq!(
            text_of(Payload::Structured(json!([{"output": "first"}, {"output": "second"}]))),
            "first"
        );
        assert_eq!(
            text_of(Payload::Structured(json!([{"content": "c", "text": "t"}]))),
            "t"
        );
        assert_eq!(text_of(Payload::Structured(json!(["a", "b"]))), "a");
        assert_eq!(
            text_of(Payload::Structured(json!([{"message": "m"}]))),
            "{\n  \"message\": \"m\"\n}"
        );
        assert_eq!(text_of(Payload::Structured(json!([7]))), "7");
    }

    #[test]
    fn test_unexpected_types() {
        assert_eq!(
            text_of(Payload::Structured(json!([]))),
            "Unexpected response type: empty array"
        );
        assert_eq!(
            text_of(Payload::Structured(json!(true))),
            "Unexpected response type: boolean"
        );
        assert_eq!(
            text_of(Payload::Structured(json!(3.5))),
            "Unexpected response type: number"
        );
    }

    #[test]
    fn test_binary_becomes_image() {
        let result = normalize(&Payload::Binary(vec![0xFF, 0xD8, 0xFF, 0xDB]), None);
        match result {
            Normalized::Image(artifact) => assert_eq!(artifact.extension(), "jpg"),
            Normalized::Text(text) => panic!("expected image, got {}", text),
        }
    }

    #[test]
    fn test_empty_binary_becomes_placeholder() {
        let result = normalize(&Payload::Binary(Vec::new()), Some("image/png"));
        assert_eq!(
            result.as_text(),
            Some("Error displaying image: image data is empty")
        );
    }

    #[test]
    fn test_normalize_response_uses_content_type() {
        let response = WebhookResponse {
            payload: Payload::Binary(vec![1, 2, 3]),
            content_type: Some("image/webp".to_string()),
        };
        match normalize_response(&response) {
            Normalized::Image(artifact) => assert_eq!(artifact.extension(), "webp"),
            other => panic!("expected image, got {:?}", other),
        }
    }

    mod proptest_normalize {
        use super::*;
        use proptest::prelude::*;

        fn is_control_start(text: &str) -> bool {
            text.chars()
                .next()
                .is_some_and(|c| (c as u32) < 0x20 && c != '\n' && c != '\r')
        }

        proptest! {
            /// Plain strings without a control or signature prefix pass through.
            #[test]
            fn plain_text_is_unchanged(text in any::<String>()) {
                prop_assume!(!is_control_start(&text));
                prop_assume!(sniff_legacy_str(&text).is_none());
                prop_assert_eq!(text_of(Payload::Text(text.clone())), text);
            }

            /// A non-empty `output` wins over every other field.
            #[test]
            fn output_field_wins(
                output in "[a-zA-Z0-9 ]{1,24}",
                others in proptest::collection::vec(
                    (
                        prop_oneof![
                            Just("response"), Just("message"), Just("text"),
                            Just("content"), Just("result"), Just("data"),
                            Just("generated_text"), Just("completion"), Just("extra"),
                        ],
                        "[a-z]{0,12}",
                    ),
                    0..8,
                ),
                output_first in any::<bool>(),
            ) {
                let mut map = serde_json::Map::new();
                if output_first {
                    map.insert("output".to_string(), json!(output));
                }
                for (key, value) in others {
                    map.insert(key.to_string(), json!(value));
                }
                if !output_first {
                    map.insert("output".to_string(), json!(output));
                }
                prop_assert_eq!(text_of(Payload::Structured(Value::Object(map))), output);
            }

            /// Unrecognized objects list their first five keys at most.
            #[test]
            fn unrecognized_keys_are_capped(
                keys in proptest::collection::vec("k_[a-z]{1,6}", 0..12),
            ) {
                let mut map = serde_json::Map::new();
                for key in &keys {
                    map.insert(key.clone(), json!(1));
                }
                let expected: Vec<String> = map.keys().take(5).cloned().collect();

                let text = text_of(Payload::Structured(Value::Object(map)));
                let listed = text
                    .strip_prefix("Response object found with keys: ")
                    .and_then(|rest| rest.strip_suffix(". Please check which key contains your content."))
                    .expect("diagnostic shape");
                let listed: Vec<String> = listed
                    .split(", ")
                    .filter(|key| !key.is_empty())
                    .map(str::to_string)
                    .collect();

                prop_assert!(listed.len() <= 5);
                prop_assert_eq!(listed, expected);
            }
        }
    }
}
