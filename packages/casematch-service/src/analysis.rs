//! Field-by-field comparison of the requested criteria against the best
//! match, reported alongside billing analysis so callers can see which
//! constraints the cascade had to relax.

use casematch_domain::{ScalarField, SearchCriteria, join_exact};
use serde::{Deserialize, Serialize};

use crate::MatchResult;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CriterionComparison {
	pub field: String,
	pub requested: Option<String>,
	pub found: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CriteriaAnalysis {
	pub matched: Vec<CriterionComparison>,
	pub unmatched: Vec<CriterionComparison>,
}

const SCALARS: [(ScalarField, &str); 11] = [
	(ScalarField::Facility, "facility"),
	(ScalarField::PayerName, "payer_name"),
	(ScalarField::PayerCategory, "payer_category"),
	(ScalarField::Clinician, "clinician"),
	(ScalarField::ClinicianSpecialty, "clinician_specialty"),
	(ScalarField::SecondaryStaff, "secondary_staff"),
	(ScalarField::SecondaryStaffCategory, "secondary_staff_category"),
	(ScalarField::EventCategory, "event_category"),
	(ScalarField::Sex, "sex"),
	(ScalarField::Archetype, "archetype"),
	(ScalarField::Region, "region"),
];

fn found_value(top: &MatchResult, field: ScalarField) -> &str {
	match field {
		ScalarField::Facility => &top.facility_code,
		ScalarField::PayerName => &top.payer_name,
		ScalarField::PayerCategory => &top.payer_category,
		ScalarField::Clinician => &top.clinician,
		ScalarField::ClinicianSpecialty => &top.clinician_specialty,
		ScalarField::SecondaryStaff => &top.secondary_staff,
		ScalarField::SecondaryStaffCategory => &top.secondary_staff_category,
		ScalarField::EventCategory => &top.event_category,
		ScalarField::Sex => &top.sex,
		ScalarField::Archetype => &top.archetype,
		ScalarField::Region => &top.region,
	}
}

/// Compares every criteria field against the top match, case-insensitively.
/// Unset criteria count as unmatched: the caller asked for nothing, so nothing
/// was honored.
pub fn analyze(criteria: &SearchCriteria, top: &MatchResult) -> CriteriaAnalysis {
	let mut matched = Vec::new();
	let mut unmatched = Vec::new();

	for (field, name) in SCALARS {
		let requested = criteria.scalar(field);
		let found = found_value(top, field);
		let comparison = CriterionComparison {
			field: name.to_string(),
			requested: requested.map(str::to_string),
			found: found.to_string(),
		};

		match requested {
			Some(value) if value.eq_ignore_ascii_case(found) => matched.push(comparison),
			_ => unmatched.push(comparison),
		}
	}
	for (name, requested, found) in [
		("diagnosis_codes", &criteria.diagnosis_codes, &top.diagnosis_codes),
		("procedure_codes", &criteria.procedure_codes, &top.procedure_codes),
	] {
		let joined = join_exact(requested);
		let comparison = CriterionComparison {
			field: name.to_string(),
			requested: (!joined.is_empty()).then(|| joined.clone()),
			found: found.to_string(),
		};

		if !joined.is_empty() && joined.eq_ignore_ascii_case(found) {
			matched.push(comparison);
		} else {
			unmatched.push(comparison);
		}
	}

	CriteriaAnalysis { matched, unmatched }
}

#[cfg(test)]
mod tests {
	use super::*;

	fn top() -> MatchResult {
		MatchResult {
			admission_id: 1,
			patient_id: 1,
			facility_code: "RSUA".into(),
			facility_id: 0,
			event_category: "Inpatient".into(),
			event_category_id: 0,
			event_date: "2024-03-10 08:30:00".into(),
			end_date: None,
			birth_date: "1980-05-20".into(),
			sex: "F".into(),
			patient_category: String::new(),
			patient_category_id: 0,
			clinician: "dr. Sari".into(),
			clinician_user_id: 0,
			clinician_specialty: String::new(),
			region: String::new(),
			archetype: String::new(),
			diagnosis_codes: "A09;E11.9".into(),
			procedure_codes: String::new(),
			invoice_class: String::new(),
			invoice_class_id: 0,
			payer_name: "ACME HEALTH".into(),
			payer_id: 0,
			payer_category: String::new(),
			invoice_net_amount: 0.,
			age: 43,
			duration_days: None,
			secondary_staff: String::new(),
			secondary_staff_category: String::new(),
			stage: 3,
			age_diff: 0,
			date_diff: 0,
			duration_diff: 0,
			diagnosis_score: 1.,
			procedure_score: 0.,
		}
	}

	#[test]
	fn case_insensitive_scalar_and_code_comparison() {
		let criteria = SearchCriteria {
			facility: Some("rsua".into()),
			sex: Some("M".into()),
			diagnosis_codes: vec!["a09".into(), "e11.9".into()],
			..Default::default()
		};
		let analysis = analyze(&criteria, &top());

		assert!(analysis.matched.iter().any(|c| c.field == "facility"));
		assert!(analysis.matched.iter().any(|c| c.field == "diagnosis_codes"));
		assert!(analysis.unmatched.iter().any(|c| c.field == "sex"));
	}

	#[test]
	fn unset_criteria_are_reported_unmatched() {
		let analysis = analyze(&SearchCriteria::default(), &top());

		assert!(analysis.matched.is_empty());
		assert!(analysis.unmatched.iter().any(|c| c.field == "clinician" && c.requested.is_none()));
	}
}
