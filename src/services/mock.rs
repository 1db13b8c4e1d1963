//! In-process collaborators with scripted replies, configurable latency
//! and call counting. Used by tests and local development without a backend.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::ServiceError;
use crate::chat::Assistant;
use crate::intake::{DoctorVerifier, PrescriptionParser, SafetyChecker, UploadRequest};
use crate::models::{
    DoctorVerification, DoctorVerificationRequest, Message, ParseResponse, SafetyCheckRequest,
    SafetyReport, VettedPrescription,
};

/// Shared plumbing: a fixed reply, an optional delay, a call counter.
struct Script<T> {
    reply: Result<T, ServiceError>,
    delay: Duration,
    calls: AtomicUsize,
}

impl<T: Clone> Script<T> {
    fn new(reply: Result<T, ServiceError>) -> Self {
        Self {
            reply,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    async fn play(&self) -> Result<T, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.reply.clone()
    }
}

pub struct MockParser {
    script: Script<ParseResponse>,
    last_upload: Mutex<Option<UploadRequest>>,
}

impl MockParser {
    pub fn new(reply: Result<ParseResponse, ServiceError>) -> Self {
        Self {
            script: Script::new(reply),
            last_upload: Mutex::new(None),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.script.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.script.calls.load(Ordering::SeqCst)
    }

    pub fn last_upload(&self) -> Option<UploadRequest> {
        self.last_upload.lock().ok().and_then(|guard| guard.clone())
    }
}

#[async_trait]
impl PrescriptionParser for MockParser {
    async fn parse(&self, upload: &UploadRequest) -> Result<ParseResponse, ServiceError> {
        if let Ok(mut last) = self.last_upload.lock() {
            *last = Some(upload.clone());
        }
        self.script.play().await
    }
}

pub struct MockVerifier {
    script: Script<DoctorVerification>,
    last_request: Mutex<Option<DoctorVerificationRequest>>,
}

impl MockVerifier {
    pub fn new(reply: Result<DoctorVerification, ServiceError>) -> Self {
        Self {
            script: Script::new(reply),
            last_request: Mutex::new(None),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.script.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.script.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<DoctorVerificationRequest> {
        self.last_request.lock().ok().and_then(|guard| guard.clone())
    }
}

#[async_trait]
impl DoctorVerifier for MockVerifier {
    async fn verify(
        &self,
        request: &DoctorVerificationRequest,
    ) -> Result<DoctorVerification, ServiceError> {
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request.clone());
        }
        self.script.play().await
    }
}

pub struct MockSafetyChecker {
    script: Script<SafetyReport>,
    last_request: Mutex<Option<SafetyCheckRequest>>,
}

impl MockSafetyChecker {
    pub fn new(reply: Result<SafetyReport, ServiceError>) -> Self {
        Self {
            script: Script::new(reply),
            last_request: Mutex::new(None),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.script.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.script.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<SafetyCheckRequest> {
        self.last_request.lock().ok().and_then(|guard| guard.clone())
    }
}

#[async_trait]
impl SafetyChecker for MockSafetyChecker {
    async fn check(&self, request: &SafetyCheckRequest) -> Result<SafetyReport, ServiceError> {
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request.clone());
        }
        self.script.play().await
    }
}

/// Assistant with a fixed reply. Remembers the last message and how many
/// prior turns it was given.
pub struct MockAssistant {
    script: Script<String>,
    last_turn: Mutex<Option<(usize, String)>>,
}

impl MockAssistant {
    pub fn new(reply: Result<String, ServiceError>) -> Self {
        Self {
            script: Script::new(reply),
            last_turn: Mutex::new(None),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.script.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.script.calls.load(Ordering::SeqCst)
    }

    /// `(prior transcript length, message)` of the most recent call.
    pub fn last_turn(&self) -> Option<(usize, String)> {
        self.last_turn.lock().ok().and_then(|guard| guard.clone())
    }
}

#[async_trait]
impl Assistant for MockAssistant {
    async fn reply(
        &self,
        _prescription: &VettedPrescription,
        transcript: &[Message],
        message: &str,
    ) -> Result<String, ServiceError> {
        if let Ok(mut last) = self.last_turn.lock() {
            *last = Some((transcript.len(), message.to_string()));
        }
        self.script.play().await
    }
}
