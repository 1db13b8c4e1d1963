use serde::{Deserialize, Serialize};

use super::specified;

/// Prescribing doctor as read off the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorInfo {
    #[serde(default)]
    pub doctor_name: String,
    #[serde(default)]
    pub registration_number: String,
    #[serde(default, deserialize_with = "specified")]
    pub hospital_name: Option<String>,
    #[serde(default, deserialize_with = "specified")]
    pub hospital_address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientInfo {
    #[serde(default, deserialize_with = "specified")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "specified")]
    pub age: Option<String>,
    #[serde(default, deserialize_with = "specified")]
    pub patient_id: Option<String>,
    #[serde(default, deserialize_with = "specified")]
    pub date: Option<String>,
}

/// One prescribed medicine. Details the parser could not read are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicineEntry {
    #[serde(rename = "medicine_name")]
    pub name: String,
    #[serde(default, deserialize_with = "specified")]
    pub dosage: Option<String>,
    #[serde(default, deserialize_with = "specified")]
    pub dosage_instruction: Option<String>,
    #[serde(default, deserialize_with = "specified")]
    pub timing: Option<String>,
    #[serde(default, deserialize_with = "specified")]
    pub duration: Option<String>,
}

impl MedicineEntry {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            dosage: None,
            dosage_instruction: None,
            timing: None,
            duration: None,
        }
    }

    pub fn dosage(&self) -> Option<&str> {
        self.dosage.as_deref()
    }

    pub fn dosage_instruction(&self) -> Option<&str> {
        self.dosage_instruction.as_deref()
    }

    pub fn timing(&self) -> Option<&str> {
        self.timing.as_deref()
    }

    pub fn duration(&self) -> Option<&str> {
        self.duration.as_deref()
    }
}

/// Structured extraction returned by the parsing service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedPrescription {
    pub doctor_info: DoctorInfo,
    #[serde(default)]
    pub patient_info: PatientInfo,
    #[serde(default)]
    pub medicines: Vec<MedicineEntry>,
}

impl ParsedPrescription {
    /// Medicine names in prescription order, as sent to the safety service.
    pub fn medicine_names(&self) -> Vec<String> {
        self.medicines.iter().map(|m| m.name.clone()).collect()
    }
}

/// Parsing service reply: `data` is present only when `success` is true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<ParsedPrescription>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ParseResponse {
    pub fn parsed(data: ParsedPrescription) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn rejected(error: &str) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_string()),
        }
    }
}

/// A medicine dropped by safety screening, kept for audit and display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemovedMedicine {
    pub medicine: MedicineEntry,
    pub reason: Option<String>,
}

/// Prescription as shown to the user: unsafe medicines removed.
///
/// `medicines` is always a subsequence of `original_medicines`, and
/// `removed_medicines` holds exactly the entries that were dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VettedPrescription {
    pub doctor_info: DoctorInfo,
    pub patient_info: PatientInfo,
    pub medicines: Vec<MedicineEntry>,
    pub original_medicines: Vec<MedicineEntry>,
    pub removed_medicines: Vec<RemovedMedicine>,
}

impl VettedPrescription {
    /// Vetted record that keeps every medicine (no usable safety screening).
    pub fn unfiltered(parsed: ParsedPrescription) -> Self {
        Self {
            medicines: parsed.medicines.clone(),
            original_medicines: parsed.medicines,
            doctor_info: parsed.doctor_info,
            patient_info: parsed.patient_info,
            removed_medicines: Vec::new(),
        }
    }

    pub fn has_removed_medicines(&self) -> bool {
        !self.removed_medicines.is_empty()
    }

    pub fn removed_names(&self) -> Vec<&str> {
        self.removed_medicines
            .iter()
            .map(|r| r.medicine.name.as_str())
            .collect()
    }
}
