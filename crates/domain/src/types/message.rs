//! Inbound message fragments as delivered by the chat transport.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier of a conversation (one chat with one user).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConversationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ConversationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<i64> for ConversationId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

/// Inline hyperlink attached to a span of the message text.
///
/// `offset` and `length` count characters, not bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkAnnotation {
    pub offset: usize,
    pub length: usize,
    pub url: String,
}

/// One raw message as captured from the transport. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessageFragment {
    pub conversation_id: ConversationId,
    pub sender: String,
    pub text: String,
    /// Label of the original author when the message was forwarded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forwarded_from: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<LinkAnnotation>,
}

impl RawMessageFragment {
    pub fn new(
        conversation_id: impl Into<ConversationId>,
        sender: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            sender: sender.into(),
            text: text.into(),
            forwarded_from: None,
            links: Vec::new(),
        }
    }

    /// Mark the fragment as forwarded from another author.
    pub fn forwarded_from(mut self, label: impl Into<String>) -> Self {
        self.forwarded_from = Some(label.into());
        self
    }

    pub fn with_link(mut self, offset: usize, length: usize, url: impl Into<String>) -> Self {
        self.links.push(LinkAnnotation { offset, length, url: url.into() });
        self
    }

    /// Text with every link annotation rendered inline as `text[url]`.
    ///
    /// Annotations are applied in offset order regardless of the order they
    /// were captured in. Overlapping annotations after the first are skipped.
    pub fn rendered_text(&self) -> String {
        if self.links.is_empty() {
            return self.text.clone();
        }

        let mut links: Vec<&LinkAnnotation> = self.links.iter().collect();
        links.sort_by_key(|link| link.offset);

        let chars: Vec<char> = self.text.chars().collect();
        let mut rendered = String::with_capacity(self.text.len() + links.len() * 16);
        let mut cursor = 0;

        for link in links {
            let end = link.offset.saturating_add(link.length).min(chars.len());
            if link.offset < cursor || end <= link.offset {
                continue;
            }
            rendered.extend(&chars[cursor..end]);
            rendered.push('[');
            rendered.push_str(&link.url);
            rendered.push(']');
            cursor = end;
        }

        rendered.extend(&chars[cursor..]);
        rendered
    }

    /// Sender or provenance label used when the fragment is narrated.
    pub fn label(&self) -> String {
        match &self.forwarded_from {
            Some(origin) => format!("Forwarded from {origin}"),
            None if self.sender.trim().is_empty() => "The user's message".to_string(),
            None => format!("Message from {}", self.sender),
        }
    }
}
