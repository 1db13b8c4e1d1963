use serde::{Deserialize, Deserializer, Serialize};

use super::specified;

/// Doctor legitimacy lookup. The council is left to the service to resolve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorVerificationRequest {
    pub doctor_name: String,
    pub registration_number: String,
    pub medical_council: Option<String>,
}

/// Closest registry record found by the verification service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestMatch {
    #[serde(default, deserialize_with = "specified")]
    pub medical_council: Option<String>,
    #[serde(default, deserialize_with = "specified")]
    pub registration_year: Option<String>,
    /// Name similarity in [0, 1]. `null` reads as 0.
    #[serde(default, deserialize_with = "nullable_score")]
    pub name_similarity: f64,
}

impl BestMatch {
    /// Similarity as a percentage rounded to one decimal, e.g. `93.4`.
    pub fn similarity_percent(&self) -> f64 {
        (self.name_similarity.clamp(0.0, 1.0) * 1000.0).round() / 10.0
    }
}

fn nullable_score<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorVerification {
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub best_match: Option<BestMatch>,
}

impl DoctorVerification {
    /// Unverified record used when the check itself could not run.
    pub fn unavailable(detail: &str) -> Self {
        Self {
            verified: false,
            reason: format!("Doctor verification could not be completed: {detail}"),
            best_match: None,
        }
    }
}
