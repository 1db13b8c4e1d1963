use std::sync::Arc;
use std::time::{Duration, Instant};

use super::reconcile::reconcile;
use super::traits::{DoctorVerifier, PrescriptionParser, SafetyChecker};
use super::{IntakeError, IntakeOutcome, IntakeWarning, PrescriptionFormat, UploadRequest};
use crate::models::{
    DoctorVerification, DoctorVerificationRequest, MatchStrategy, ParsedPrescription,
    SafetyCheckRequest, SafetyReport,
};
use crate::services::ServiceError;

/// Reason shown when the parser rejects a document without saying why.
const DEFAULT_PARSE_FAILURE: &str = "Unknown error";

/// Default bound on each stage-2 call.
const DEFAULT_CHECK_TIMEOUT: Duration = Duration::from_secs(30);

/// Intake workflow orchestrator.
///
/// Coordinates: validate → parse → (verify doctor ‖ screen medicines) → reconcile.
/// Holds no state between runs.
pub struct IntakeOrchestrator {
    parser: Arc<dyn PrescriptionParser>,
    verifier: Arc<dyn DoctorVerifier>,
    safety: Arc<dyn SafetyChecker>,
    check_timeout: Duration,
    match_strategy: MatchStrategy,
}

impl IntakeOrchestrator {
    pub fn new(
        parser: Arc<dyn PrescriptionParser>,
        verifier: Arc<dyn DoctorVerifier>,
        safety: Arc<dyn SafetyChecker>,
    ) -> Self {
        Self {
            parser,
            verifier,
            safety,
            check_timeout: DEFAULT_CHECK_TIMEOUT,
            match_strategy: MatchStrategy::default(),
        }
    }

    pub fn with_check_timeout(mut self, timeout: Duration) -> Self {
        self.check_timeout = timeout;
        self
    }

    pub fn with_match_strategy(mut self, strategy: MatchStrategy) -> Self {
        self.match_strategy = strategy;
        self
    }

    /// Run the full intake workflow for one uploaded file.
    ///
    /// Fails only on an unsupported media type (before any network call)
    /// or when parsing fails. Verification and screening failures degrade
    /// the outcome and are listed in `IntakeOutcome::warnings`.
    pub async fn submit_prescription(
        &self,
        upload: UploadRequest,
    ) -> Result<IntakeOutcome, IntakeError> {
        let started = Instant::now();

        // Step 1: Validate declared type
        let format = match upload.validate() {
            Ok(format) => format,
            Err(e) => {
                tracing::warn!(media_type = %upload.media_type, "Rejected upload: unsupported type");
                return Err(e);
            }
        };
        if let Some(sniffed) = PrescriptionFormat::sniff(&upload.bytes) {
            if sniffed != format {
                tracing::warn!(
                    declared = ?format,
                    detected = ?sniffed,
                    "Declared media type does not match file content"
                );
            }
        }
        tracing::info!(?format, size_bytes = upload.len(), "Prescription upload accepted");

        // Step 2: Parse
        let parsed = self.parse_stage(&upload).await?;

        // Step 3: Verify doctor and screen medicines concurrently
        let (verification, safety, warnings) = self.verification_stage(&parsed).await;

        // Step 4: Reconcile
        let prescription = reconcile(parsed, &safety, self.match_strategy);

        tracing::info!(
            kept = prescription.medicines.len(),
            removed = prescription.removed_medicines.len(),
            verified = verification.verified,
            degraded = !warnings.is_empty(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Prescription intake complete"
        );

        Ok(IntakeOutcome {
            prescription,
            verification,
            safety,
            warnings,
        })
    }

    async fn parse_stage(&self, upload: &UploadRequest) -> Result<ParsedPrescription, IntakeError> {
        let response = self.parser.parse(upload).await.map_err(|e| {
            tracing::error!(error = %e, "Parsing service call failed");
            IntakeError::ParseFailed {
                reason: e.to_string(),
            }
        })?;

        match response.data {
            Some(parsed) if response.success => {
                tracing::info!(medicines = parsed.medicines.len(), "Prescription parsed");
                Ok(parsed)
            }
            _ => {
                let reason = response
                    .error
                    .filter(|e| !e.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_PARSE_FAILURE.to_string());
                tracing::warn!(%reason, "Parsing service rejected the document");
                Err(IntakeError::ParseFailed { reason })
            }
        }
    }

    /// Both calls run concurrently and are awaited together; neither failure
    /// aborts the other.
    async fn verification_stage(
        &self,
        parsed: &ParsedPrescription,
    ) -> (DoctorVerification, SafetyReport, Vec<IntakeWarning>) {
        let doctor_request = DoctorVerificationRequest {
            doctor_name: parsed.doctor_info.doctor_name.clone(),
            registration_number: parsed.doctor_info.registration_number.clone(),
            medical_council: None,
        };
        let safety_request = SafetyCheckRequest {
            medicines: parsed.medicine_names(),
        };

        let (doctor_result, safety_result) = tokio::join!(
            bounded(self.check_timeout, self.verifier.verify(&doctor_request)),
            bounded(self.check_timeout, self.safety.check(&safety_request)),
        );

        let mut warnings = Vec::new();

        let verification = match doctor_result {
            Ok(verification) => {
                tracing::info!(verified = verification.verified, "Doctor verification returned");
                verification
            }
            Err(e) => {
                tracing::warn!(error = %e, "Doctor verification degraded");
                let verification = DoctorVerification::unavailable(&e.to_string());
                warnings.push(IntakeWarning::VerificationDegraded {
                    reason: verification.reason.clone(),
                });
                verification
            }
        };

        let safety = match safety_result {
            Ok(report) if report.success => {
                tracing::info!(
                    screened = report.results.len(),
                    flagged = report.flagged().count(),
                    "Medicine safety check returned"
                );
                report
            }
            Ok(report) => {
                let reason = report
                    .error
                    .clone()
                    .unwrap_or_else(|| "Safety service could not screen the medicines".into());
                tracing::warn!(%reason, "Safety check unsuccessful, keeping all medicines");
                warnings.push(IntakeWarning::SafetyCheckDegraded { reason });
                report
            }
            Err(e) => {
                tracing::warn!(error = %e, "Safety check degraded, keeping all medicines");
                let report = SafetyReport::unavailable(&e.to_string());
                warnings.push(IntakeWarning::SafetyCheckDegraded {
                    reason: report.error.clone().unwrap_or_default(),
                });
                report
            }
        };

        (verification, safety, warnings)
    }
}

/// Bound a collaborator call so a hung service cannot stall the join.
async fn bounded<T, F>(limit: Duration, call: F) -> Result<T, ServiceError>
where
    F: std::future::Future<Output = Result<T, ServiceError>>,
{
    tokio::time::timeout(limit, call)
        .await
        .unwrap_or(Err(ServiceError::Timeout(limit)))
}
