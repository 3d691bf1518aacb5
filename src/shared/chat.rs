use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ChatContent {
    Text { text: String },
    StartSession,
    EndSession,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub timestamp: DateTime<Utc>,
    pub msg_id: Uuid,
    pub content: Vec<ChatContent>,
}

impl ChatMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            msg_id: Uuid::new_v4(),
            content: vec![ChatContent::Text { text: text.into() }],
        }
    }

    /// First text item, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(|item| match item {
            ChatContent::Text { text } => Some(text.as_str()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatAcknowledgement {
    pub timestamp: DateTime<Utc>,
    pub acknowledged_msg_id: Uuid,
}

impl ChatAcknowledgement {
    pub fn for_message(message: &ChatMessage) -> Self {
        Self {
            timestamp: Utc::now(),
            acknowledged_msg_id: message.msg_id,
        }
    }
}

/// Body of `POST /chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatEnvelope {
    pub sender: String,
    pub message: ChatMessage,
}

/// Body of `POST /chat/ack`: a peer confirming it received one of our messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcknowledgementEnvelope {
    pub sender: String,
    pub acknowledgement: ChatAcknowledgement,
}

/// Answer to `POST /chat`: the acknowledgement plus every reply produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatExchange {
    pub acknowledgement: ChatAcknowledgement,
    pub messages: Vec<ChatMessage>,
}

/// An agent that answers chat text. Session bookkeeping lives in [`handle_envelope`].
#[async_trait]
pub trait ChatAgent: Send + Sync {
    fn welcome(&self) -> String;

    async fn reply(&self, sender: &str, text: &str) -> String;
}

/// Acknowledge `envelope.message`, then answer each content item in order.
pub async fn handle_envelope<A>(agent: &A, envelope: ChatEnvelope) -> ChatExchange
where
    A: ChatAgent + ?Sized,
{
    let ChatEnvelope { sender, message } = envelope;
    let acknowledgement = ChatAcknowledgement::for_message(&message);

    let mut messages = Vec::new();
    for item in &message.content {
        match item {
            ChatContent::StartSession => {
                info!("Started chat session with {}", sender);
                messages.push(ChatMessage::text(agent.welcome()));
            }
            ChatContent::Text { text } => {
                info!("Processing message from {}: {}", sender, text);
                messages.push(ChatMessage::text(agent.reply(&sender, text).await));
            }
            ChatContent::EndSession => {
                info!("Chat session with {} ended", sender);
            }
        }
    }

    ChatExchange {
        acknowledgement,
        messages,
    }
}

/// Incoming acknowledgements need no reply; they are only logged.
pub fn handle_acknowledgement(envelope: &AcknowledgementEnvelope) {
    info!(
        "Message {} acknowledged by {}",
        envelope.acknowledgement.acknowledged_msg_id, envelope.sender
    );
}
