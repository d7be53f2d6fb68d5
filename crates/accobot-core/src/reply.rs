//! Normalization of answering-service responses.
//!
//! The service may answer with a bare string or with an object carrying an
//! `answer` field, optionally wrapped in a `{success, message, data}`
//! envelope. [`AssistantReply::from_value`] classifies the body and
//! [`AssistantReply::into_text`] maps every variant to display text.

use serde_json::Value;

/// Text used when the response matches no known shape.
pub const FALLBACK_REPLY: &str = "Sorry, I couldn't process your request.";

#[derive(Debug, Clone, PartialEq)]
pub enum AssistantReply {
    PlainText(String),
    StructuredAnswer(String),
    Unrecognized,
}

impl AssistantReply {
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(text) => AssistantReply::PlainText(text.clone()),
            Value::Object(map) => {
                if let Some(answer) = map.get("answer") {
                    return match answer {
                        Value::String(text) => AssistantReply::StructuredAnswer(text.clone()),
                        Value::Null => AssistantReply::Unrecognized,
                        other => AssistantReply::StructuredAnswer(other.to_string()),
                    };
                }
                // Success envelope added by the backend middleware.
                match (map.get("success"), map.get("data")) {
                    (Some(Value::Bool(true)), Some(data)) if !data.is_null() => {
                        AssistantReply::from_value(data)
                    }
                    _ => AssistantReply::Unrecognized,
                }
            }
            _ => AssistantReply::Unrecognized,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, AssistantReply::Unrecognized)
    }

    pub fn into_text(self) -> String {
        match self {
            AssistantReply::PlainText(text) | AssistantReply::StructuredAnswer(text) => text,
            AssistantReply::Unrecognized => FALLBACK_REPLY.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_string_is_used_verbatim() {
        let reply = AssistantReply::from_value(&json!("success to receive your message"));
        assert_eq!(reply.into_text(), "success to receive your message");
    }

    #[test]
    fn answer_field_is_extracted() {
        let reply = AssistantReply::from_value(&json!({"answer": "Q1 revenue was $5M", "sources": []}));
        assert_eq!(reply, AssistantReply::StructuredAnswer("Q1 revenue was $5M".into()));
    }

    #[test]
    fn non_string_answer_is_coerced() {
        let reply = AssistantReply::from_value(&json!({"answer": {"total": 5}}));
        assert_eq!(reply.into_text(), r#"{"total":5}"#);
        let reply = AssistantReply::from_value(&json!({"answer": 42}));
        assert_eq!(reply.into_text(), "42");
    }

    #[test]
    fn envelope_is_unwrapped() {
        let body = json!({"success": true, "message": "ok", "data": {"answer": "fine"}});
        assert_eq!(AssistantReply::from_value(&body).into_text(), "fine");
    }

    #[test]
    fn unknown_shapes_fall_back() {
        for body in [json!(null), json!(3), json!([1, 2]), json!({"result": "x"}), json!({"answer": null})] {
            let reply = AssistantReply::from_value(&body);
            assert!(!reply.is_recognized());
            assert_eq!(reply.into_text(), FALLBACK_REPLY);
        }
    }
}
