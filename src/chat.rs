//! Pharmacist chat scoped to one vetted prescription.
//!
//! - `Assistant` trait (reply collaborator) and the offline `SimulatedAssistant`
//! - `ChatSession`: append-only transcript with serialized turns
//! - Quick-question suggestions for the empty state

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Message, VettedPrescription};
use crate::services::ServiceError;

/// Opening assistant turn of every session.
pub const GREETING: &str =
    "Hello! I'm your AI Pharmacist. I've reviewed your prescription. How can I help you today?";

/// Fixed reply of the offline assistant.
pub const SIMULATED_REPLY: &str = "I understand your question. Let me help you with that. \
     This is a simulated response. In production, this would connect to your AI pharmacist API.";

pub const MAX_MESSAGE_CHARS: usize = 2000;

// ═══════════════════════════════════════════
// Assistant
// ═══════════════════════════════════════════

/// Produces one reply per user turn.
///
/// `transcript` holds every turn before `message`, greeting included.
#[async_trait]
pub trait Assistant: Send + Sync {
    async fn reply(
        &self,
        prescription: &VettedPrescription,
        transcript: &[Message],
        message: &str,
    ) -> Result<String, ServiceError>;
}

/// Stand-in assistant for running without a chat backend.
pub struct SimulatedAssistant {
    delay: Duration,
}

impl SimulatedAssistant {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for SimulatedAssistant {
    fn default() -> Self {
        Self::new(Duration::from_millis(1500))
    }
}

#[async_trait]
impl Assistant for SimulatedAssistant {
    async fn reply(
        &self,
        _prescription: &VettedPrescription,
        _transcript: &[Message],
        _message: &str,
    ) -> Result<String, ServiceError> {
        tokio::time::sleep(self.delay).await;
        Ok(SIMULATED_REPLY.to_string())
    }
}

// ═══════════════════════════════════════════
// Prompt suggestions
// ═══════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptSuggestion {
    pub text: String,
    pub category: String,
}

/// Quick questions offered before the user has typed anything.
pub fn default_prompt_suggestions() -> Vec<PromptSuggestion> {
    [
        ("What are the side effects?", "side_effects"),
        ("Can I take these with food?", "food"),
        ("What if I miss a dose?", "missed_dose"),
        ("Are there any interactions?", "interactions"),
    ]
    .into_iter()
    .map(|(text, category)| PromptSuggestion {
        text: text.into(),
        category: category.into(),
    })
    .collect()
}

// ═══════════════════════════════════════════
// Session
// ═══════════════════════════════════════════

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Message cannot be empty")]
    EmptyMessage,

    #[error("Message too long (max {max} chars)")]
    MessageTooLong { max: usize },

    #[error("Assistant unavailable: {0}")]
    Assistant(#[from] ServiceError),

    #[error("Internal lock error")]
    LockPoisoned,
}

pub struct ChatSession {
    prescription: VettedPrescription,
    transcript: Mutex<Vec<Message>>,
    /// Held for a whole turn so replies land in send order.
    turn: tokio::sync::Mutex<()>,
    assistant: Arc<dyn Assistant>,
}

impl ChatSession {
    pub fn new(prescription: VettedPrescription, assistant: Arc<dyn Assistant>) -> Self {
        Self {
            prescription,
            transcript: Mutex::new(vec![Message::assistant(GREETING)]),
            turn: tokio::sync::Mutex::new(()),
            assistant,
        }
    }

    pub fn transcript(&self) -> Result<Vec<Message>, ChatError> {
        self.transcript
            .lock()
            .map(|t| t.clone())
            .map_err(|_| ChatError::LockPoisoned)
    }

    /// Append a user turn and wait for the assistant's reply.
    ///
    /// On assistant failure the user turn stays recorded and no reply is
    /// appended.
    pub async fn send_message(&self, text: &str) -> Result<Message, ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if text.chars().count() > MAX_MESSAGE_CHARS {
            return Err(ChatError::MessageTooLong {
                max: MAX_MESSAGE_CHARS,
            });
        }

        let _turn = self.turn.lock().await;

        let history = self.transcript()?;
        self.push(Message::user(text))?;

        let reply = match self
            .assistant
            .reply(&self.prescription, &history, text)
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(error = %e, turns = history.len() + 1, "Assistant reply failed");
                return Err(e.into());
            }
        };

        let message = Message::assistant(reply);
        self.push(message.clone())?;
        tracing::debug!(turns = history.len() + 2, "Chat turn complete");
        Ok(message)
    }

    fn push(&self, message: Message) -> Result<(), ChatError> {
        self.transcript
            .lock()
            .map_err(|_| ChatError::LockPoisoned)?
            .push(message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DoctorInfo, MedicineEntry, MessageRole, PatientInfo, ParsedPrescription};
    use crate::services::MockAssistant;

    fn prescription() -> VettedPrescription {
        VettedPrescription::unfiltered(ParsedPrescription {
            doctor_info: DoctorInfo {
                doctor_name: "Dr. A. Sharma".into(),
                registration_number: "MMC-2011-4471".into(),
                hospital_name: None,
                hospital_address: None,
            },
            patient_info: PatientInfo::default(),
            medicines: vec![MedicineEntry::named("Amoxicillin")],
        })
    }

    fn session(assistant: MockAssistant) -> (ChatSession, Arc<MockAssistant>) {
        let assistant = Arc::new(assistant);
        (ChatSession::new(prescription(), assistant.clone()), assistant)
    }

    #[test]
    fn transcript_opens_with_greeting() {
        let (chat, _) = session(MockAssistant::new(Ok("ok".into())));
        let transcript = chat.transcript().unwrap();
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript[0].role, MessageRole::Assistant);
        assert_eq!(transcript[0].content, GREETING);
    }

    #[tokio::test]
    async fn send_appends_user_then_reply() {
        let (chat, assistant) = session(MockAssistant::new(Ok("Take it after meals.".into())));

        let reply = chat.send_message("  Can I take these with food? ").await.unwrap();

        assert_eq!(reply.role, MessageRole::Assistant);
        assert_eq!(reply.content, "Take it after meals.");
        let transcript = chat.transcript().unwrap();
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript[1].role, MessageRole::User);
        assert_eq!(transcript[1].content, "Can I take these with food?");
        assert_eq!(transcript[2].id, reply.id);
        assert_eq!(
            assistant.last_turn(),
            Some((1, "Can I take these with food?".to_string()))
        );
    }

    #[tokio::test]
    async fn blank_message_is_rejected_without_calling_assistant() {
        let (chat, assistant) = session(MockAssistant::new(Ok("ok".into())));

        let err = chat.send_message("   \n").await.unwrap_err();

        assert!(matches!(err, ChatError::EmptyMessage));
        assert_eq!(assistant.calls(), 0);
        assert_eq!(chat.transcript().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn long_message_is_rejected() {
        let (chat, assistant) = session(MockAssistant::new(Ok("ok".into())));
        let text = "é".repeat(MAX_MESSAGE_CHARS + 1);

        let err = chat.send_message(&text).await.unwrap_err();

        assert!(matches!(err, ChatError::MessageTooLong { max: 2000 }));
        assert_eq!(assistant.calls(), 0);

        // Multi-byte chars count once each
        let at_limit = "é".repeat(MAX_MESSAGE_CHARS);
        chat.send_message(&at_limit).await.unwrap();
    }

    #[tokio::test]
    async fn assistant_failure_keeps_user_turn() {
        let (chat, _) = session(MockAssistant::new(Err(ServiceError::Connection(
            "http://localhost:8000".into(),
        ))));

        let err = chat.send_message("What if I miss a dose?").await.unwrap_err();

        assert!(matches!(err, ChatError::Assistant(ServiceError::Connection(_))));
        let transcript = chat.transcript().unwrap();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[1].role, MessageRole::User);
    }

    #[tokio::test]
    async fn concurrent_sends_are_serialized() {
        let (chat, _) = session(
            MockAssistant::new(Ok("answer".into())).with_delay(Duration::from_millis(100)),
        );
        let chat = Arc::new(chat);

        let first = tokio::spawn({
            let chat = chat.clone();
            async move { chat.send_message("first").await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        let second = tokio::spawn({
            let chat = chat.clone();
            async move { chat.send_message("second").await }
        });
        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();

        let transcript = chat.transcript().unwrap();
        let turns: Vec<(MessageRole, &str)> = transcript
            .iter()
            .skip(1)
            .map(|m| (m.role, m.content.as_str()))
            .collect();
        assert_eq!(
            turns,
            vec![
                (MessageRole::User, "first"),
                (MessageRole::Assistant, "answer"),
                (MessageRole::User, "second"),
                (MessageRole::Assistant, "answer"),
            ]
        );
    }

    #[tokio::test]
    async fn simulated_assistant_replies_after_delay() {
        let assistant = SimulatedAssistant::new(Duration::from_millis(50));
        let started = std::time::Instant::now();

        let reply = assistant
            .reply(&prescription(), &[], "Are there any interactions?")
            .await
            .unwrap();

        assert_eq!(reply, SIMULATED_REPLY);
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn default_suggestions_are_the_quick_questions() {
        let suggestions = default_prompt_suggestions();
        assert_eq!(suggestions.len(), 4);
        assert_eq!(suggestions[0].text, "What are the side effects?");
        assert!(suggestions.iter().all(|s| !s.category.is_empty()));
    }

    #[test]
    fn assistant_trait_is_object_safe() {
        let _: Arc<dyn Assistant> = Arc::new(SimulatedAssistant::default());
    }
}
