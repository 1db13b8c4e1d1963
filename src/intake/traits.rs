//! Remote collaborators consumed by the intake workflow.
//!
//! Three traits, one per backend service. All are object-safe so the
//! orchestrator can hold them as `Arc<dyn ...>` and tests can swap in mocks.

use async_trait::async_trait;

use super::UploadRequest;
use crate::models::{
    DoctorVerification, DoctorVerificationRequest, ParseResponse, SafetyCheckRequest, SafetyReport,
};
use crate::services::ServiceError;

/// Turns an uploaded document into a structured prescription.
#[async_trait]
pub trait PrescriptionParser: Send + Sync {
    /// `Err` means the call failed; an unsuccessful parse is `Ok` with
    /// `success == false`.
    async fn parse(&self, upload: &UploadRequest) -> Result<ParseResponse, ServiceError>;
}

/// Checks the prescribing doctor against the medical registry.
#[async_trait]
pub trait DoctorVerifier: Send + Sync {
    async fn verify(
        &self,
        request: &DoctorVerificationRequest,
    ) -> Result<DoctorVerification, ServiceError>;
}

/// Screens medicine names for safety concerns.
#[async_trait]
pub trait SafetyChecker: Send + Sync {
    async fn check(&self, request: &SafetyCheckRequest) -> Result<SafetyReport, ServiceError>;
}
