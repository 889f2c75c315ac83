//! Send options and the SES SendEmail payload shape
//!
//! [`SendOptions`] is the flat per-call option set, assembled by merging a
//! mailer's defaults with caller overrides. [`MessagePayload`] is the exact
//! structure handed to the SES v2 templated-send API; serde attributes encode
//! the wire names and the field-omission rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Flat options for one send, before assembly.
///
/// `to` and `reply_to` stay loosely typed (`serde_json::Value`) because
/// callers may pass a single address, a list, or nothing at all;
/// [`ensure_sequence`] coerces them at assembly time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SendOptions {
    pub from_name: Option<String>,
    pub from_email: Option<String>,
    pub to: Option<Value>,
    pub reply_to: Option<Value>,
    pub template: Option<String>,
    pub merge_vars: Option<Value>,
    pub configuration_set_name: Option<String>,
    pub contact_list_name: Option<String>,
    pub topic_name: Option<String>,
}

impl SendOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_address(mut self, name: &str, email: &str) -> Self {
        self.from_name = Some(name.to_string());
        self.from_email = Some(email.to_string());
        self
    }

    pub fn to(mut self, to: impl Into<Value>) -> Self {
        self.to = Some(to.into());
        self
    }

    pub fn reply_to(mut self, reply_to: impl Into<Value>) -> Self {
        self.reply_to = Some(reply_to.into());
        self
    }

    pub fn template(mut self, template: &str) -> Self {
        self.template = Some(template.to_string());
        self
    }

    pub fn merge_vars(mut self, merge_vars: impl Into<Value>) -> Self {
        self.merge_vars = Some(merge_vars.into());
        self
    }

    pub fn configuration_set_name(mut self, name: &str) -> Self {
        self.configuration_set_name = Some(name.to_string());
        self
    }

    pub fn contact_list_name(mut self, name: &str) -> Self {
        self.contact_list_name = Some(name.to_string());
        self
    }

    pub fn topic_name(mut self, name: &str) -> Self {
        self.topic_name = Some(name.to_string());
        self
    }

    /// Merge `self` over `defaults`: every field the caller set wins, every
    /// field left unset falls back to the default.
    pub fn merged_over(self, defaults: &SendOptions) -> SendOptions {
        SendOptions {
            from_name: self.from_name.or_else(|| defaults.from_name.clone()),
            from_email: self.from_email.or_else(|| defaults.from_email.clone()),
            to: self.to.or_else(|| defaults.to.clone()),
            reply_to: self.reply_to.or_else(|| defaults.reply_to.clone()),
            template: self.template.or_else(|| defaults.template.clone()),
            merge_vars: self.merge_vars.or_else(|| defaults.merge_vars.clone()),
            configuration_set_name: self
                .configuration_set_name
                .or_else(|| defaults.configuration_set_name.clone()),
            contact_list_name: self
                .contact_list_name
                .or_else(|| defaults.contact_list_name.clone()),
            topic_name: self.topic_name.or_else(|| defaults.topic_name.clone()),
        }
    }
}

/// Coerce an address-ish value to a list of addresses.
///
/// Lists pass through, a lone string becomes a one-element list, and anything
/// else (absent, null, booleans, numbers) becomes the empty list. Total by
/// design; malformed input never raises.
pub fn ensure_sequence(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        Some(Value::String(s)) => vec![s.clone()],
        _ => Vec::new(),
    }
}

/// The payload handed to the SES v2 SendEmail operation.
///
/// `configurationSetName` and `listManagementOptions` are dropped from the
/// serialized form entirely when unset (key absent, not null). Everything
/// else is always present, even when empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MessagePayload {
    pub from_email_address: String,
    pub destination: Destination,
    pub reply_to_addresses: Vec<String>,
    pub content: Content,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration_set_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_management_options: Option<ListManagementOptions>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    pub to_addresses: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    pub template: TemplateContent,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TemplateContent {
    pub template_name: String,
    /// Serialized merge-variable JSON, substituted by the SES template engine.
    pub template_data: String,
}

/// List-management block, included only when a contact list is named.
///
/// `topicName` follows its own rule: it is serialized even when null, which
/// SES treats as "no topic" (distinct from omitting the whole block).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListManagementOptions {
    pub contact_list_name: String,
    pub topic_name: Option<String>,
}

impl MessagePayload {
    /// Assemble the SES payload from merged options and the already-resolved
    /// merge-variable JSON.
    pub fn build(options: &SendOptions, template_data: String) -> Self {
        let from_name = options.from_name.as_deref().unwrap_or_default();
        let from_email = options.from_email.as_deref().unwrap_or_default();

        Self {
            from_email_address: format!("{from_name} <{from_email}>"),
            destination: Destination {
                to_addresses: ensure_sequence(options.to.as_ref()),
            },
            reply_to_addresses: ensure_sequence(options.reply_to.as_ref()),
            content: Content {
                template: TemplateContent {
                    template_name: options.template.clone().unwrap_or_default(),
                    template_data,
                },
            },
            configuration_set_name: options.configuration_set_name.clone(),
            list_management_options: options.contact_list_name.as_ref().map(|contact_list| {
                ListManagementOptions {
                    contact_list_name: contact_list.clone(),
                    topic_name: options.topic_name.clone(),
                }
            }),
        }
    }
}

/// Entry in the test-mode capture list: the payload plus the template that
/// produced it.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DeliveryRecord {
    #[serde(flatten)]
    pub message: MessagePayload,
    pub template: String,
}

/// Result of a live SES send.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProviderResponse {
    /// Message ID assigned by SES.
    pub message_id: String,
    /// Timestamp when the email was accepted.
    pub queued_at: DateTime<Utc>,
}

/// What happened to one `deliver()` call.
///
/// `Blocked` is a normal outcome, not an error; provider failures surface as
/// `Err(MailerError::SendFailed)` from `deliver()` instead.
#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryOutcome {
    /// An interceptor vetoed the delivery; nothing was sent or captured.
    Blocked,
    /// Test mode: the message was appended to the capture list.
    Captured(DeliveryRecord),
    /// Live mode: SES accepted the message.
    Sent(ProviderResponse),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn full_options() -> SendOptions {
        SendOptions::new()
            .from_address("name", "user@example.com")
            .to("user@example.com")
            .reply_to("user@example.com")
            .template("template")
            .configuration_set_name("test_config")
            .contact_list_name("contact_list_name")
    }

    #[test]
    fn test_build_with_all_fields() {
        let payload = MessagePayload::build(&full_options(), r#"{"k":"v"}"#.to_string());

        assert_eq!(payload.from_email_address, "name <user@example.com>");
        assert_eq!(payload.destination.to_addresses, vec!["user@example.com"]);
        assert_eq!(payload.reply_to_addresses, vec!["user@example.com"]);
        assert_eq!(payload.content.template.template_name, "template");
        assert_eq!(payload.content.template.template_data, r#"{"k":"v"}"#);
        assert_eq!(payload.configuration_set_name.as_deref(), Some("test_config"));
        assert_eq!(
            payload.list_management_options,
            Some(ListManagementOptions {
                contact_list_name: "contact_list_name".to_string(),
                topic_name: None,
            })
        );
    }

    #[test]
    fn test_from_address_with_empty_parts() {
        let payload = MessagePayload::build(&SendOptions::new(), String::new());
        // Both parts may be empty but the field is never omitted.
        assert_eq!(payload.from_email_address, " <>");
    }

    #[test]
    fn test_configuration_set_omitted_from_json() {
        let mut options = full_options();
        options.configuration_set_name = None;
        options.contact_list_name = None;

        let payload = MessagePayload::build(&options, String::new());
        let json = serde_json::to_value(&payload).unwrap();

        let object = json.as_object().unwrap();
        assert!(!object.contains_key("configurationSetName"));
        assert!(!object.contains_key("listManagementOptions"));
    }

    #[test]
    fn test_topic_name_serialized_as_null() {
        let payload = MessagePayload::build(&full_options(), String::new());
        let json = serde_json::to_value(&payload).unwrap();

        // topicName is a valid null, not an omitted key.
        assert_eq!(json["listManagementOptions"]["topicName"], json!(null));
        assert_eq!(
            json["listManagementOptions"]["contactListName"],
            json!("contact_list_name")
        );
    }

    #[test]
    fn test_wire_field_names() {
        let payload = MessagePayload::build(&full_options(), "{}".to_string());
        let json = serde_json::to_value(&payload).unwrap();

        assert!(json.get("fromEmailAddress").is_some());
        assert!(json["destination"].get("toAddresses").is_some());
        assert!(json.get("replyToAddresses").is_some());
        assert!(json["content"]["template"].get("templateName").is_some());
        assert!(json["content"]["template"].get("templateData").is_some());
    }

    #[test]
    fn test_ensure_sequence_passes_lists_through() {
        assert_eq!(
            ensure_sequence(Some(&json!(["a", "b"]))),
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn test_ensure_sequence_wraps_single_string() {
        assert_eq!(ensure_sequence(Some(&json!("a"))), vec!["a".to_string()]);
    }

    #[test]
    fn test_ensure_sequence_defaults_to_empty() {
        assert_eq!(ensure_sequence(None), Vec::<String>::new());
        assert_eq!(ensure_sequence(Some(&json!(null))), Vec::<String>::new());
        assert_eq!(ensure_sequence(Some(&json!(true))), Vec::<String>::new());
        assert_eq!(ensure_sequence(Some(&json!(42))), Vec::<String>::new());
    }

    #[test]
    fn test_merged_over_caller_wins() {
        let defaults = SendOptions::new()
            .from_address("Default", "default@example.com")
            .template("default-template")
            .configuration_set_name("default_config");

        let merged = SendOptions::new()
            .template("override-template")
            .to("user@example.com")
            .merged_over(&defaults);

        assert_eq!(merged.template.as_deref(), Some("override-template"));
        assert_eq!(merged.from_email.as_deref(), Some("default@example.com"));
        assert_eq!(merged.configuration_set_name.as_deref(), Some("default_config"));
        assert_eq!(merged.to, Some(json!("user@example.com")));
    }

    #[test]
    fn test_payload_round_trips_through_json() {
        let payload = MessagePayload::build(&full_options(), r#"{"a":"1"}"#.to_string());
        let encoded = serde_json::to_string(&payload).unwrap();
        let decoded: MessagePayload = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, payload);
    }
}
