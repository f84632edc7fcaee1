use crate::{
    domain::logic::channel_address::is_anonymized,
    entities::{ContactInfo, InboundMessage, NumberStatus},
};

pub(crate) const MESSAGE_EVENT: &str = "onmessage";

#[derive(Debug, serde_derive::Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SendMessageRequest<'a> {
    pub(crate) phone: &'a str,
    pub(crate) message: &'a str,
    pub(crate) is_group: bool,
}

/// `{"status": "...", "response": ...}` wrapper around every REST reply.
#[derive(Debug, serde_derive::Deserialize)]
pub(crate) struct ResponseEnvelopeModel<T> {
    pub(crate) response: T,
}

/// Serialized chat id (ex. `5511987654321@c.us`).
#[derive(Debug, Default, serde_derive::Deserialize)]
pub(crate) struct WidModel {
    #[serde(rename = "_serialized", default)]
    pub(crate) serialized: String,
    #[serde(default)]
    pub(crate) user: Option<String>,
    #[serde(default)]
    pub(crate) server: Option<String>,
}

impl WidModel {
    /// `user` part of ids on the phone-number server. Anonymized (`lid`) ids
    /// carry opaque digits there.
    fn phone_user(self) -> Option<String> {
        let anonymized = self.server.as_deref() == Some("lid")
            || is_anonymized(&self.serialized);
        self.user.filter(|u| !anonymized && !u.is_empty())
    }
}

#[derive(Debug, serde_derive::Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NumberStatusModel {
    #[serde(default)]
    pub(crate) id: WidModel,
    #[serde(default)]
    pub(crate) number_exists: bool,
}

impl Into<NumberStatus> for NumberStatusModel {
    fn into(self) -> NumberStatus {
        NumberStatus {
            number_exists: self.number_exists && !self.id.serialized.is_empty(),
            id: self.id.serialized,
        }
    }
}

#[derive(Debug, serde_derive::Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ContactModel {
    #[serde(default)]
    pub(crate) id: WidModel,
    #[serde(default)]
    pub(crate) phone_number: Option<String>,
}

impl Into<ContactInfo> for ContactModel {
    fn into(self) -> ContactInfo {
        let id = self.id.serialized.clone();
        ContactInfo {
            id,
            phone_number: self.phone_number.filter(|p| !p.is_empty()),
            user: self.id.phone_user(),
        }
    }
}

/// Webhook event posted by the WPPConnect server.
#[derive(Debug, serde_derive::Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WebhookEventModel {
    #[serde(default)]
    pub(crate) event: String,
    #[serde(default)]
    pub(crate) from: String,
    #[serde(default)]
    pub(crate) author: Option<String>,
    #[serde(default)]
    pub(crate) body: Option<String>,
    #[serde(default)]
    pub(crate) is_group_msg: bool,
    #[serde(default)]
    pub(crate) is_status: bool,
    #[serde(default)]
    pub(crate) from_me: bool,
}

impl WebhookEventModel {
    /// Inbound message carried by the event. `None` for other event types,
    /// for our own messages and for events without a sender.
    pub(crate) fn into_inbound(self) -> Option<InboundMessage> {
        if self.event.to_lowercase() != MESSAGE_EVENT || self.from_me || self.from.is_empty() {
            return None;
        }
        Some(InboundMessage {
            address: self.from,
            author: self.author.filter(|a| !a.is_empty()),
            body: self.body.unwrap_or_default(),
            is_group: self.is_group_msg,
            is_status: self.is_status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_event_maps_to_inbound() {
        let event: WebhookEventModel = serde_json::from_str(
            r#"{"event": "onmessage", "session": "s", "from": "123@lid",
                "author": null, "body": "gastei 10", "isGroupMsg": false, "type": "chat"}"#,
        )
        .unwrap();

        let message = event.into_inbound().unwrap();
        assert_eq!(message.address, "123@lid");
        assert_eq!(message.body, "gastei 10");
        assert!(!message.is_group);
    }

    #[test]
    fn test_other_events_are_ignored() {
        for raw in [
            r#"{"event": "onack", "from": "1@c.us"}"#,
            r#"{"event": "onmessage", "from": "1@c.us", "fromMe": true, "body": "x"}"#,
            r#"{"event": "onmessage", "body": "x"}"#,
        ] {
            let event: WebhookEventModel = serde_json::from_str(raw).unwrap();
            assert!(event.into_inbound().is_none(), "{raw}");
        }
    }

    #[test]
    fn test_number_status_response() {
        let envelope: ResponseEnvelopeModel<NumberStatusModel> = serde_json::from_str(
            r#"{"status": "success", "response": {"id": {"server": "c.us",
                "user": "557999887766", "_serialized": "557999887766@c.us"}, "numberExists": true}}"#,
        )
        .unwrap();

        let status: NumberStatus = envelope.response.into();
        assert!(status.number_exists);
        assert_eq!(status.id, "557999887766@c.us");
    }

    #[test]
    fn test_contact_user_kept_only_for_phone_ids() {
        let anonymized: ContactModel = serde_json::from_str(
            r#"{"id": {"server": "lid", "user": "123456789012345",
                "_serialized": "123456789012345@lid"}, "phoneNumber": null}"#,
        )
        .unwrap();
        let phone: ContactModel = serde_json::from_str(
            r#"{"id": {"server": "c.us", "user": "5511987654321",
                "_serialized": "5511987654321@c.us"}}"#,
        )
        .unwrap();

        let anonymized: ContactInfo = anonymized.into();
        let phone: ContactInfo = phone.into();
        assert_eq!(anonymized.id, "123456789012345@lid");
        assert_eq!(anonymized.user, None);
        assert_eq!(anonymized.phone_number, None);
        assert_eq!(phone.user.as_deref(), Some("5511987654321"));
    }
}
