// libs/appointment-cell/src/services/prescription.rs
use tracing::debug;
use uuid::Uuid;

use crate::models::{AppointmentError, Medicine, PrescriptionDraft};

/// Checks a doctor's prescription before it is attached. Medicine rows with a
/// blank field are dropped; at least one complete row must remain.
pub fn prepare_draft(mut draft: PrescriptionDraft) -> Result<PrescriptionDraft, AppointmentError> {
    if let Some(id) = &draft.id {
        if id.trim().is_empty() {
            return Err(AppointmentError::ValidationError(
                "prescription id must not be blank".to_string(),
            ));
        }
    }

    let submitted = draft.medicines.len();
    draft.medicines.retain(Medicine::is_complete);
    if draft.medicines.len() < submitted {
        debug!(
            "Dropped {} incomplete medicine row(s) from prescription draft",
            submitted - draft.medicines.len()
        );
    }

    if draft.medicines.is_empty() {
        return Err(AppointmentError::ValidationError(
            "a prescription needs at least one complete medicine".to_string(),
        ));
    }

    if draft.instructions.trim().is_empty() {
        return Err(AppointmentError::ValidationError(
            "prescription instructions are required".to_string(),
        ));
    }

    Ok(draft)
}

pub fn new_prescription_id() -> String {
    format!("rx-{}", Uuid::new_v4())
}

/// Default care summary for a consultation that ends with a prescription.
pub fn generate_care_summary(medicines: &[Medicine], instructions: &str) -> String {
    let mut summary = String::from("Care Instructions:\n\nMedicines:\n");
    for medicine in medicines {
        summary.push_str(&format!(
            "• {} - {}, {} for {}\n",
            medicine.name, medicine.dosage, medicine.timing, medicine.duration
        ));
    }
    summary.push('\n');
    summary.push_str(instructions);
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn draft(medicines: Vec<Medicine>, instructions: &str) -> PrescriptionDraft {
        PrescriptionDraft {
            id: None,
            medicines,
            instructions: instructions.to_string(),
        }
    }

    #[test]
    fn complete_draft_passes() {
        let rx = draft(
            vec![Medicine::new("Cetirizine 10mg", "1 tablet", "Night", "3 days")],
            "Take medicines after food.",
        );
        assert_eq!(prepare_draft(rx.clone()).unwrap().medicines, rx.medicines);
    }

    #[test]
    fn incomplete_rows_are_dropped() {
        let partial = draft(
            vec![
                Medicine::new("Paracetamol 500mg", "1 tablet", "Morning & Night", "5 days"),
                Medicine::new("Vitamin C 500mg", "1 tablet", "", "7 days"),
                Medicine::new("", "", "", ""),
            ],
            "Rest well",
        );

        let prepared = prepare_draft(partial).unwrap();
        assert_eq!(prepared.medicines.len(), 1);
        assert_eq!(prepared.medicines[0].name, "Paracetamol 500mg");
    }

    #[test]
    fn draft_without_complete_rows_is_rejected() {
        assert_matches!(
            prepare_draft(draft(vec![], "Rest well")),
            Err(AppointmentError::ValidationError(_))
        );
        assert_matches!(
            prepare_draft(draft(vec![Medicine::new("Cetirizine 10mg", "", "Night", "3 days")], "Rest well")),
            Err(AppointmentError::ValidationError(msg)) if msg.contains("complete medicine")
        );
    }

    #[test]
    fn instructions_are_required() {
        let rx = draft(vec![Medicine::new("Cetirizine 10mg", "1 tablet", "Night", "3 days")], "   ");
        assert_matches!(prepare_draft(rx), Err(AppointmentError::ValidationError(_)));
    }

    #[test]
    fn care_summary_lists_each_medicine() {
        let summary = generate_care_summary(
            &[
                Medicine::new("Paracetamol 500mg", "1 tablet", "Morning & Night", "5 days"),
                Medicine::new("Cetirizine 10mg", "1 tablet", "Night", "3 days"),
            ],
            "Stay hydrated.",
        );

        assert!(summary.starts_with("Care Instructions:"));
        assert!(summary.contains("• Paracetamol 500mg - 1 tablet, Morning & Night for 5 days\n"));
        assert!(summary.contains("• Cetirizine 10mg - 1 tablet, Night for 3 days\n"));
        assert!(summary.ends_with("\nStay hydrated."));
    }

    #[test]
    fn generated_ids_are_prefixed_and_unique() {
        let first = new_prescription_id();
        assert!(first.starts_with("rx-"));
        assert_ne!(first, new_prescription_id());
    }
}
