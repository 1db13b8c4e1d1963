use serde::{Deserialize, Serialize};

/// Ordered medicine names submitted for screening.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyCheckRequest {
    pub medicines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicineSafetyResult {
    pub medicine_name: String,
    #[serde(default)]
    pub flagged: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Screening outcome. `success == false` means the report must not be
/// used for filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyReport {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub results: Vec<MedicineSafetyResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SafetyReport {
    /// Report standing in for a screening that could not run.
    pub fn unavailable(detail: &str) -> Self {
        Self {
            success: false,
            results: Vec::new(),
            error: Some(format!("Unable to screen medicines: {detail}")),
        }
    }

    pub fn flagged(&self) -> impl Iterator<Item = &MedicineSafetyResult> {
        self.results.iter().filter(|r| r.flagged)
    }

    /// First result reported for `name`, if any.
    pub fn result_for(&self, name: &str) -> Option<&MedicineSafetyResult> {
        self.results.iter().find(|r| r.medicine_name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> SafetyReport {
        serde_json::from_str(
            r#"{
                "success": true,
                "results": [
                    {"medicine_name": "Amoxicillin", "flagged": false},
                    {"medicine_name": "Ibuprofen", "flagged": true, "reason": "Banned combination"},
                    {"medicine_name": "Ibuprofen", "flagged": false}
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn flagged_filters_results() {
        let r = report();
        let flagged: Vec<_> = r.flagged().map(|m| m.medicine_name.as_str()).collect();
        assert_eq!(flagged, vec!["Ibuprofen"]);
    }

    #[test]
    fn result_for_returns_first_match() {
        let r = report();
        let hit = r.result_for("Ibuprofen").unwrap();
        assert!(hit.flagged);
        assert_eq!(hit.reason.as_deref(), Some("Banned combination"));
        assert!(r.result_for("Paracetamol").is_none());
    }

    #[test]
    fn absent_success_is_false() {
        let r: SafetyReport = serde_json::from_str(r#"{"results": []}"#).unwrap();
        assert!(!r.success);
    }

    #[test]
    fn unavailable_is_unsuccessful() {
        let r = SafetyReport::unavailable("timed out");
        assert!(!r.success);
        assert!(r.results.is_empty());
        assert!(r.error.unwrap().contains("timed out"));
    }
}
