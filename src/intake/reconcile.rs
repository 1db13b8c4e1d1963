//! Derive the vetted prescription from the parsed one and the safety report.
//!
//! Fail-open: an unsuccessful report never removes anything.

use crate::models::{
    MatchStrategy, MedicineEntry, MedicineSafetyResult, ParsedPrescription, RemovedMedicine,
    SafetyReport, VettedPrescription,
};

/// Split medicines into the safe subset and the removed audit list.
///
/// A medicine is removed iff its matching result exists and is flagged.
/// With `ByName`, the first result carrying the same name decides for every
/// entry of that name. With `ByIndex`, result `i` decides for medicine `i`
/// and only when the names agree.
pub fn reconcile(
    parsed: ParsedPrescription,
    report: &SafetyReport,
    strategy: MatchStrategy,
) -> VettedPrescription {
    if !report.success {
        return VettedPrescription::unfiltered(parsed);
    }

    let mut medicines = Vec::with_capacity(parsed.medicines.len());
    let mut removed = Vec::new();

    for (index, medicine) in parsed.medicines.iter().enumerate() {
        match matching_result(report, strategy, index, medicine) {
            Some(result) if result.flagged => removed.push(RemovedMedicine {
                medicine: medicine.clone(),
                reason: result.reason.clone(),
            }),
            _ => medicines.push(medicine.clone()),
        }
    }

    tracing::debug!(
        kept = medicines.len(),
        removed = removed.len(),
        ?strategy,
        "Safety reconciliation complete"
    );

    VettedPrescription {
        doctor_info: parsed.doctor_info,
        patient_info: parsed.patient_info,
        medicines,
        original_medicines: parsed.medicines,
        removed_medicines: removed,
    }
}

fn matching_result<'r>(
    report: &'r SafetyReport,
    strategy: MatchStrategy,
    index: usize,
    medicine: &MedicineEntry,
) -> Option<&'r MedicineSafetyResult> {
    match strategy {
        MatchStrategy::ByName => report.result_for(&medicine.name),
        MatchStrategy::ByIndex => report
            .results
            .get(index)
            .filter(|r| r.medicine_name == medicine.name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DoctorInfo, PatientInfo};

    fn parsed(names: &[&str]) -> ParsedPrescription {
        ParsedPrescription {
            doctor_info: DoctorInfo {
                doctor_name: "Dr. A. Sharma".into(),
                registration_number: "MMC-2011-4471".into(),
                hospital_name: None,
                hospital_address: None,
            },
            patient_info: PatientInfo::default(),
            medicines: names.iter().map(|n| MedicineEntry::named(n)).collect(),
        }
    }

    fn result(name: &str, flagged: bool) -> MedicineSafetyResult {
        MedicineSafetyResult {
            medicine_name: name.into(),
            flagged,
            reason: flagged.then(|| format!("{name} is unsafe")),
        }
    }

    fn report(success: bool, results: Vec<MedicineSafetyResult>) -> SafetyReport {
        SafetyReport {
            success,
            results,
            error: None,
        }
    }

    fn names(list: &[MedicineEntry]) -> Vec<&str> {
        list.iter().map(|m| m.name.as_str()).collect()
    }

    #[test]
    fn flagged_medicine_is_removed() {
        let report = report(
            true,
            vec![result("Amoxicillin", false), result("Ibuprofen", true)],
        );
        let vetted = reconcile(parsed(&["Amoxicillin", "Ibuprofen"]), &report, MatchStrategy::ByName);

        assert_eq!(names(&vetted.medicines), vec!["Amoxicillin"]);
        assert_eq!(vetted.removed_names(), vec!["Ibuprofen"]);
        assert_eq!(
            vetted.removed_medicines[0].reason.as_deref(),
            Some("Ibuprofen is unsafe")
        );
        assert_eq!(names(&vetted.original_medicines), vec!["Amoxicillin", "Ibuprofen"]);
    }

    #[test]
    fn n_flagged_of_m_leaves_m_minus_n() {
        let all = ["A", "B", "C", "D", "E"];
        let report = report(
            true,
            vec![
                result("A", true),
                result("B", false),
                result("C", true),
                result("D", false),
                result("E", true),
            ],
        );
        let vetted = reconcile(parsed(&all), &report, MatchStrategy::ByName);

        assert_eq!(vetted.medicines.len(), 2);
        assert_eq!(vetted.removed_medicines.len(), 3);
        for removed in &vetted.removed_medicines {
            assert!(vetted.original_medicines.contains(&removed.medicine));
        }
    }

    #[test]
    fn unsuccessful_report_keeps_everything() {
        let report = report(false, vec![result("Ibuprofen", true)]);
        let original = parsed(&["Amoxicillin", "Ibuprofen"]);
        let vetted = reconcile(original.clone(), &report, MatchStrategy::ByName);

        assert_eq!(vetted.medicines, original.medicines);
        assert!(vetted.removed_medicines.is_empty());
    }

    #[test]
    fn medicine_without_result_is_kept() {
        let report = report(true, vec![result("Ibuprofen", true)]);
        let vetted = reconcile(parsed(&["Paracetamol", "Ibuprofen"]), &report, MatchStrategy::ByName);
        assert_eq!(names(&vetted.medicines), vec!["Paracetamol"]);
    }

    #[test]
    fn name_matching_is_exact() {
        let report = report(true, vec![result("ibuprofen", true)]);
        let vetted = reconcile(parsed(&["Ibuprofen"]), &report, MatchStrategy::ByName);
        assert_eq!(names(&vetted.medicines), vec!["Ibuprofen"]);
    }

    #[test]
    fn duplicate_names_follow_first_result() {
        // Second "Ibuprofen" entry is screened as safe, but the first result wins.
        let report = report(
            true,
            vec![result("Ibuprofen", true), result("Ibuprofen", false)],
        );
        let vetted = reconcile(parsed(&["Ibuprofen", "Ibuprofen"]), &report, MatchStrategy::ByName);
        assert!(vetted.medicines.is_empty());
        assert_eq!(vetted.removed_medicines.len(), 2);
    }

    #[test]
    fn index_strategy_disambiguates_duplicates() {
        let report = report(
            true,
            vec![result("Ibuprofen", true), result("Ibuprofen", false)],
        );
        let vetted = reconcile(parsed(&["Ibuprofen", "Ibuprofen"]), &report, MatchStrategy::ByIndex);
        assert_eq!(vetted.medicines.len(), 1);
        assert_eq!(vetted.removed_medicines.len(), 1);
    }

    #[test]
    fn index_strategy_ignores_misaligned_results() {
        let report = report(true, vec![result("Ibuprofen", true)]);
        let vetted = reconcile(parsed(&["Amoxicillin", "Ibuprofen"]), &report, MatchStrategy::ByIndex);
        assert_eq!(names(&vetted.medicines), vec!["Amoxicillin", "Ibuprofen"]);
    }

    #[test]
    fn order_is_preserved() {
        let report = report(true, vec![result("B", true)]);
        let vetted = reconcile(parsed(&["A", "B", "C", "D"]), &report, MatchStrategy::ByName);
        assert_eq!(names(&vetted.medicines), vec!["A", "C", "D"]);
    }
}
