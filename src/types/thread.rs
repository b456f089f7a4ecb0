use serde::{Deserialize, Serialize};

/// Id prefix for messages minted on the client before the backend has seen them.
pub const LOCAL_ID_PREFIX: &str = "temp-";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    pub title: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Confidence {
    #[serde(default)]
    pub routing: f64,
    #[serde(default)]
    pub retrieval: f64,
    #[serde(default)]
    pub response: f64,
    #[serde(default)]
    pub overall: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub thread_id: String,
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
    pub created_at: String,
}

impl Message {
    /// Builds a message that only exists client-side until the next thread fetch.
    pub fn provisional(thread_id: &str, role: Role, content: String) -> Self {
        Self {
            id: format!("{LOCAL_ID_PREFIX}{}", uuid::Uuid::new_v4()),
            thread_id: thread_id.to_string(),
            role,
            content,
            route: None,
            confidence: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn is_provisional(&self) -> bool {
        self.id.starts_with(LOCAL_ID_PREFIX)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadWithMessages {
    #[serde(flatten)]
    pub thread: Thread,
    #[serde(default)]
    pub messages: Vec<Message>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_message_with_null_route_deserializes() {
        let json = r#"{
            "id": "6f1c",
            "thread_id": "t-1",
            "role": "assistant",
            "content": "Try an ambient scribe.",
            "route": null,
            "created_at": "2025-01-02T03:04:05+00:00"
        }"#;
        let message: Message = serde_json::from_str(json).unwrap();
        assert_eq!(message.role, Role::Assistant);
        assert_eq!(message.route, None);
        assert_eq!(message.confidence, None);
        assert!(!message.is_provisional());
    }

    #[test]
    fn test_thread_with_messages_flattens_thread_fields() {
        let json = r#"{
            "id": "t-1",
            "title": "New Chat",
            "created_at": "2025-01-02T03:04:05+00:00",
            "updated_at": "2025-01-02T03:04:05+00:00"
        }"#;
        let detail: ThreadWithMessages = serde_json::from_str(json).unwrap();
        assert_eq!(detail.thread.id, "t-1");
        assert!(detail.messages.is_empty());
    }

    #[test]
    fn test_provisional_messages_use_local_prefix_and_unique_ids() {
        let a = Message::provisional("t-1", Role::User, "hi".to_string());
        let b = Message::provisional("t-1", Role::Assistant, String::new());
        assert!(a.is_provisional());
        assert!(b.is_provisional());
        assert_ne!(a.id, b.id);
        assert_eq!(b.thread_id, "t-1");
    }

    #[test]
    fn test_partial_confidence_defaults_missing_scores() {
        let confidence: Confidence = serde_json::from_str(r#"{"overall":0.8}"#).unwrap();
        assert_eq!(confidence.overall, 0.8);
        assert_eq!(confidence.routing, 0.0);
    }
}
