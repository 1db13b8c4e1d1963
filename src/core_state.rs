//! Transport-agnostic application state.
//!
//! `CoreState` owns the view state machine, the intake orchestrator and
//! the active chat session. The local HTTP API is a thin layer over it;
//! any other front end can drive the same operations.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use thiserror::Error;

use crate::chat::{self, Assistant, ChatError, ChatSession, PromptSuggestion, SimulatedAssistant};
use crate::config::AppConfig;
use crate::intake::{IntakeError, IntakeOrchestrator, IntakeOutcome, UploadRequest};
use crate::models::{AssistantMode, Message, View};
use crate::services::{BackendClient, ServiceError};
use crate::view_state::{IntakeTicket, ViewController, ViewError};

// ═══════════════════════════════════════════════════════════
// CoreState
// ═══════════════════════════════════════════════════════════

/// Shared application state, wrapped in `Arc` at startup.
///
/// Lock order: `view` before `chat`. Neither std lock is held across an
/// `.await`.
pub struct CoreState {
    config: AppConfig,
    orchestrator: IntakeOrchestrator,
    assistant: Arc<dyn Assistant>,
    view: Mutex<ViewController>,
    /// Survives close/open of the chat view; dropped by `start_upload`.
    chat: Mutex<Option<Arc<ChatSession>>>,
}

/// Read-only view of the session for the UI.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub view: View,
    pub intake_in_flight: bool,
    pub outcome: Option<IntakeOutcome>,
    pub transcript: Vec<Message>,
}

impl CoreState {
    pub fn new(
        config: AppConfig,
        orchestrator: IntakeOrchestrator,
        assistant: Arc<dyn Assistant>,
    ) -> Self {
        Self {
            config,
            orchestrator,
            assistant,
            view: Mutex::new(ViewController::new()),
            chat: Mutex::new(None),
        }
    }

    /// Wire every collaborator to the configured backend.
    pub fn from_config(config: AppConfig) -> Result<Self, ServiceError> {
        let backend = Arc::new(BackendClient::from_config(&config)?);

        let assistant: Arc<dyn Assistant> = match config.assistant_mode {
            AssistantMode::Http => backend.clone(),
            AssistantMode::Simulated => {
                Arc::new(SimulatedAssistant::new(config.simulated_reply_delay))
            }
        };

        let orchestrator = IntakeOrchestrator::new(backend.clone(), backend.clone(), backend)
            .with_check_timeout(config.check_timeout)
            .with_match_strategy(config.match_strategy);

        tracing::info!(
            service_url = %config.service_url,
            assistant = %config.assistant_mode,
            match_strategy = %config.match_strategy,
            "Core state initialized"
        );

        Ok(Self::new(config, orchestrator, assistant))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    // ── Intake ──────────────────────────────────────────────

    /// Run an intake for the upload view and move to details on success.
    ///
    /// A result that arrives after `start_upload` is discarded and reported
    /// as `ViewError::StaleIntake`.
    pub async fn submit_prescription(
        &self,
        upload: UploadRequest,
    ) -> Result<IntakeOutcome, CoreError> {
        let ticket = self.lock_view()?.begin_intake()?;
        let mut pending = PendingIntake::new(&self.view, ticket);

        let result = self.orchestrator.submit_prescription(upload).await;

        let mut view = self.lock_view()?;
        pending.disarm();
        match result {
            Ok(outcome) => match view.complete_intake(ticket, outcome.clone()) {
                Ok(()) => Ok(outcome),
                Err(e) => {
                    tracing::info!(error = %e, "Discarding intake result");
                    Err(e.into())
                }
            },
            Err(e) => {
                if let Err(stale) = view.fail_intake(ticket) {
                    tracing::debug!(error = %stale, "Failed intake already superseded");
                }
                Err(e.into())
            }
        }
    }

    // ── View transitions ────────────────────────────────────

    /// Reset to a blank upload view. Always succeeds unless a lock is poisoned.
    pub fn start_upload(&self) -> Result<(), CoreError> {
        let mut view = self.lock_view()?;
        view.start_upload();
        *self.lock_chat()? = None;
        tracing::info!("Session reset to upload view");
        Ok(())
    }

    pub fn open_chat(&self) -> Result<(), CoreError> {
        let mut view = self.lock_view()?;
        view.open_chat()?;

        let mut chat = self.lock_chat()?;
        if chat.is_none() {
            let prescription = view
                .outcome()
                .map(|o| o.prescription.clone())
                .ok_or(ViewError::NoPrescription)?;
            *chat = Some(Arc::new(ChatSession::new(prescription, self.assistant.clone())));
            tracing::debug!("Chat session started");
        }
        Ok(())
    }

    pub fn close_chat(&self) -> Result<(), CoreError> {
        self.lock_view()?.close_chat()?;
        Ok(())
    }

    // ── Chat ────────────────────────────────────────────────

    /// Send a user message in the chat view and return the reply.
    pub async fn send_message(&self, text: &str) -> Result<Message, CoreError> {
        let session = {
            let view = self.lock_view()?;
            if view.view() != View::Chat {
                return Err(ViewError::InvalidTransition {
                    action: "send a message",
                    from: view.view(),
                }
                .into());
            }
            self.lock_chat()?.clone().ok_or(ViewError::NoPrescription)?
        };

        Ok(session.send_message(text).await?)
    }

    pub fn chat_suggestions(&self) -> Vec<PromptSuggestion> {
        chat::default_prompt_suggestions()
    }

    pub fn snapshot(&self) -> Result<SessionSnapshot, CoreError> {
        let view = self.lock_view()?;
        let transcript = match self.lock_chat()?.as_ref() {
            Some(session) => session.transcript()?,
            None => Vec::new(),
        };
        Ok(SessionSnapshot {
            view: view.view(),
            intake_in_flight: view.intake_in_flight(),
            outcome: view.outcome().cloned(),
            transcript,
        })
    }

    fn lock_view(&self) -> Result<MutexGuard<'_, ViewController>, CoreError> {
        self.view.lock().map_err(|_| CoreError::LockPoisoned)
    }

    fn lock_chat(&self) -> Result<MutexGuard<'_, Option<Arc<ChatSession>>>, CoreError> {
        self.chat.lock().map_err(|_| CoreError::LockPoisoned)
    }
}

/// Releases the in-flight marker if an intake future is dropped before
/// it settles (client disconnect, aborted task).
struct PendingIntake<'a> {
    view: &'a Mutex<ViewController>,
    ticket: Option<IntakeTicket>,
}

impl<'a> PendingIntake<'a> {
    fn new(view: &'a Mutex<ViewController>, ticket: IntakeTicket) -> Self {
        Self {
            view,
            ticket: Some(ticket),
        }
    }

    fn disarm(&mut self) {
        self.ticket = None;
    }
}

impl Drop for PendingIntake<'_> {
    fn drop(&mut self) {
        let Some(ticket) = self.ticket.take() else {
            return;
        };
        let Ok(mut view) = self.view.lock() else {
            return;
        };
        if view.fail_intake(ticket).is_ok() {
            tracing::info!("Abandoned intake released");
        }
    }
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Intake(#[from] IntakeError),
    #[error(transparent)]
    View(#[from] ViewError),
    #[error(transparent)]
    Chat(#[from] ChatError),
    #[error("Internal lock error")]
    LockPoisoned,
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::models::{
        DoctorInfo, DoctorVerification, MedicineEntry, MedicineSafetyResult, MessageRole,
        ParseResponse, ParsedPrescription, PatientInfo, SafetyReport,
    };
    use crate::services::{MockAssistant, MockParser, MockSafetyChecker, MockVerifier};

    fn parsed() -> ParsedPrescription {
        ParsedPrescription {
            doctor_info: DoctorInfo {
                doctor_name: "Dr. A. Sharma".into(),
                registration_number: "MMC-2011-4471".into(),
                hospital_name: None,
                hospital_address: None,
            },
            patient_info: PatientInfo::default(),
            medicines: vec![
                MedicineEntry::named("Amoxicillin"),
                MedicineEntry::named("Ibuprofen"),
            ],
        }
    }

    fn report() -> SafetyReport {
        SafetyReport {
            success: true,
            results: vec![
                MedicineSafetyResult {
                    medicine_name: "Amoxicillin".into(),
                    flagged: false,
                    reason: None,
                },
                MedicineSafetyResult {
                    medicine_name: "Ibuprofen".into(),
                    flagged: true,
                    reason: Some("Contraindicated with reported allergy".into()),
                },
            ],
            error: None,
        }
    }

    fn state_with(parser: MockParser) -> (CoreState, Arc<MockAssistant>) {
        let assistant = Arc::new(MockAssistant::new(Ok(
            "Amoxicillin can cause mild stomach upset.".into(),
        )));
        let orchestrator = IntakeOrchestrator::new(
            Arc::new(parser),
            Arc::new(MockVerifier::new(Ok(DoctorVerification {
                verified: true,
                reason: "Registration number matches".into(),
                best_match: None,
            }))),
            Arc::new(MockSafetyChecker::new(Ok(report()))),
        );
        (
            CoreState::new(AppConfig::default(), orchestrator, assistant.clone()),
            assistant,
        )
    }

    fn state() -> CoreState {
        state_with(MockParser::new(Ok(ParseResponse::parsed(parsed())))).0
    }

    fn pdf() -> UploadRequest {
        UploadRequest::new(b"%PDF-1.4".to_vec(), "application/pdf")
    }

    #[tokio::test]
    async fn intake_moves_to_details() {
        let core = state();

        let outcome = core.submit_prescription(pdf()).await.unwrap();

        assert_eq!(outcome.prescription.removed_names(), vec!["Ibuprofen"]);
        let snapshot = core.snapshot().unwrap();
        assert_eq!(snapshot.view, View::Details);
        assert!(!snapshot.intake_in_flight);
        assert_eq!(snapshot.outcome, Some(outcome));
        assert!(snapshot.transcript.is_empty());
    }

    #[tokio::test]
    async fn invalid_upload_stays_in_upload_view() {
        let core = state();

        let err = core
            .submit_prescription(UploadRequest::new(vec![0; 8], "image/gif"))
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Intake(IntakeError::InvalidFileType { .. })));
        let snapshot = core.snapshot().unwrap();
        assert_eq!(snapshot.view, View::Upload);
        assert!(!snapshot.intake_in_flight);

        // Retry works
        core.submit_prescription(pdf()).await.unwrap();
    }

    #[tokio::test]
    async fn chat_round_trip() {
        let core = state();
        core.submit_prescription(pdf()).await.unwrap();

        core.open_chat().unwrap();
        let reply = core.send_message("What are the side effects?").await.unwrap();

        assert_eq!(reply.role, MessageRole::Assistant);
        let snapshot = core.snapshot().unwrap();
        assert_eq!(snapshot.view, View::Chat);
        assert_eq!(snapshot.transcript.len(), 3);
        assert_eq!(snapshot.transcript[0].content, chat::GREETING);
    }

    #[tokio::test]
    async fn transcript_survives_close_and_reopen() {
        let core = state();
        core.submit_prescription(pdf()).await.unwrap();
        core.open_chat().unwrap();
        core.send_message("What if I miss a dose?").await.unwrap();

        core.close_chat().unwrap();
        assert_eq!(core.snapshot().unwrap().view, View::Details);
        core.open_chat().unwrap();

        assert_eq!(core.snapshot().unwrap().transcript.len(), 3);
    }

    #[tokio::test]
    async fn send_outside_chat_view_is_rejected() {
        let (core, assistant) = state_with(MockParser::new(Ok(ParseResponse::parsed(parsed()))));
        core.submit_prescription(pdf()).await.unwrap();

        let err = core.send_message("hello").await.unwrap_err();

        assert!(matches!(
            err,
            CoreError::View(ViewError::InvalidTransition { from: View::Details, .. })
        ));
        assert_eq!(assistant.calls(), 0);
    }

    #[test]
    fn open_chat_without_prescription_fails() {
        let core = state();
        assert!(matches!(
            core.open_chat().unwrap_err(),
            CoreError::View(ViewError::InvalidTransition { from: View::Upload, .. })
        ));
    }

    #[tokio::test]
    async fn start_upload_clears_everything() {
        let core = state();
        core.submit_prescription(pdf()).await.unwrap();
        core.open_chat().unwrap();
        core.send_message("Are there any interactions?").await.unwrap();

        core.start_upload().unwrap();

        let snapshot = core.snapshot().unwrap();
        assert_eq!(snapshot.view, View::Upload);
        assert!(snapshot.outcome.is_none());
        assert!(snapshot.transcript.is_empty());

        // Next intake starts a fresh transcript
        core.submit_prescription(pdf()).await.unwrap();
        core.open_chat().unwrap();
        assert_eq!(core.snapshot().unwrap().transcript.len(), 1);
    }

    #[tokio::test]
    async fn result_after_reset_is_discarded() {
        let (core, _) = state_with(
            MockParser::new(Ok(ParseResponse::parsed(parsed())))
                .with_delay(Duration::from_millis(200)),
        );
        let core = Arc::new(core);

        let pending = tokio::spawn({
            let core = core.clone();
            async move { core.submit_prescription(pdf()).await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(core.snapshot().unwrap().intake_in_flight);
        core.start_upload().unwrap();

        let err = pending.await.unwrap().unwrap_err();

        assert!(matches!(err, CoreError::View(ViewError::StaleIntake)));
        let snapshot = core.snapshot().unwrap();
        assert_eq!(snapshot.view, View::Upload);
        assert!(snapshot.outcome.is_none());
    }

    #[tokio::test]
    async fn abandoned_intake_releases_upload_view() {
        let (core, _) = state_with(
            MockParser::new(Ok(ParseResponse::parsed(parsed())))
                .with_delay(Duration::from_millis(200)),
        );
        let core = Arc::new(core);

        let pending = tokio::spawn({
            let core = core.clone();
            async move { core.submit_prescription(pdf()).await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(core.snapshot().unwrap().intake_in_flight);

        pending.abort();
        assert!(pending.await.unwrap_err().is_cancelled());

        let snapshot = core.snapshot().unwrap();
        assert!(!snapshot.intake_in_flight);
        assert_eq!(snapshot.view, View::Upload);

        core.submit_prescription(pdf()).await.unwrap();
        assert_eq!(core.snapshot().unwrap().view, View::Details);
    }

    #[tokio::test]
    async fn concurrent_submission_is_rejected() {
        let (core, _) = state_with(
            MockParser::new(Ok(ParseResponse::parsed(parsed())))
                .with_delay(Duration::from_millis(200)),
        );
        let core = Arc::new(core);

        let first = tokio::spawn({
            let core = core.clone();
            async move { core.submit_prescription(pdf()).await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;

        let err = core.submit_prescription(pdf()).await.unwrap_err();
        assert!(matches!(err, CoreError::View(ViewError::UploadInProgress)));
        first.await.unwrap().unwrap();
    }

    #[test]
    fn simulated_mode_builds_without_backend() {
        let config = AppConfig {
            assistant_mode: AssistantMode::Simulated,
            ..AppConfig::default()
        };
        let core = CoreState::from_config(config).unwrap();
        assert_eq!(core.config().assistant_mode, AssistantMode::Simulated);
        assert_eq!(core.chat_suggestions().len(), 4);
    }
}
