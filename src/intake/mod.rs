//! Prescription intake workflow.
//!
//! ```text
//! validate → parse → (verify doctor ‖ screen medicines) → reconcile
//! ```
//!
//! Only `InvalidFileType` and `ParseFailed` abort a run. A failed doctor
//! check or safety screening degrades the outcome instead and is reported
//! as an `IntakeWarning`.

pub mod format;
pub mod orchestrator;
pub mod reconcile;
pub mod traits;

pub use format::*;
pub use orchestrator::*;
pub use reconcile::*;
pub use traits::*;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{DoctorVerification, SafetyReport, VettedPrescription};

/// Fatal intake failures. The user has to start over from the upload view.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntakeError {
    #[error("Unsupported file type '{declared}': please upload a PDF, JPEG or PNG file")]
    InvalidFileType { declared: String },

    #[error("Prescription could not be parsed: {reason}")]
    ParseFailed { reason: String },
}

/// Non-fatal degradation of a completed intake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntakeWarning {
    /// Doctor check failed; the prescription is shown as unverified.
    VerificationDegraded { reason: String },
    /// Safety screening failed; every medicine was kept.
    SafetyCheckDegraded { reason: String },
}

impl IntakeWarning {
    pub fn reason(&self) -> &str {
        match self {
            Self::VerificationDegraded { reason } | Self::SafetyCheckDegraded { reason } => reason,
        }
    }
}

/// Everything the details view needs after a successful intake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntakeOutcome {
    pub prescription: VettedPrescription,
    pub verification: DoctorVerification,
    pub safety: SafetyReport,
    pub warnings: Vec<IntakeWarning>,
}

impl IntakeOutcome {
    pub fn is_degraded(&self) -> bool {
        !self.warnings.is_empty()
    }
}
