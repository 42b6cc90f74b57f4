use serde::{Deserialize, Serialize};

/// Raw, caller-supplied search criteria. Every field is optional; the request
/// is rejected upstream when all of them are empty. Code lists keep the
/// caller's order — exact matching is order-sensitive.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct SearchCriteria {
	pub facility: Option<String>,
	pub payer_name: Option<String>,
	pub payer_category: Option<String>,
	pub clinician: Option<String>,
	pub clinician_specialty: Option<String>,
	pub secondary_staff: Option<String>,
	pub secondary_staff_category: Option<String>,
	pub event_category: Option<String>,
	pub sex: Option<String>,
	pub archetype: Option<String>,
	pub region: Option<String>,
	#[serde(default)]
	pub diagnosis_codes: Vec<String>,
	#[serde(default)]
	pub procedure_codes: Vec<String>,
	pub event_date: Option<String>,
	pub end_date: Option<String>,
	pub birth_date: Option<String>,
}

/// Scalar admission fields a stage can filter on or use as a match-priority
/// tie-break.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScalarField {
	Facility,
	PayerName,
	PayerCategory,
	Clinician,
	ClinicianSpecialty,
	SecondaryStaff,
	SecondaryStaffCategory,
	EventCategory,
	Sex,
	Archetype,
	Region,
}

impl SearchCriteria {
	pub fn scalar(&self, field: ScalarField) -> Option<&str> {
		let raw = match field {
			ScalarField::Facility => self.facility.as_deref(),
			ScalarField::PayerName => self.payer_name.as_deref(),
			ScalarField::PayerCategory => self.payer_category.as_deref(),
			ScalarField::Clinician => self.clinician.as_deref(),
			ScalarField::ClinicianSpecialty => self.clinician_specialty.as_deref(),
			ScalarField::SecondaryStaff => self.secondary_staff.as_deref(),
			ScalarField::SecondaryStaffCategory => self.secondary_staff_category.as_deref(),
			ScalarField::EventCategory => self.event_category.as_deref(),
			ScalarField::Sex => self.sex.as_deref(),
			ScalarField::Archetype => self.archetype.as_deref(),
			ScalarField::Region => self.region.as_deref(),
		};

		raw.map(str::trim).filter(|value| !value.is_empty())
	}

	/// True when at least one criteria field carries a value. Requests where
	/// this is false are rejected before the cascade starts.
	pub fn has_any(&self) -> bool {
		const SCALARS: [ScalarField; 11] = [
			ScalarField::Facility,
			ScalarField::PayerName,
			ScalarField::PayerCategory,
			ScalarField::Clinician,
			ScalarField::ClinicianSpecialty,
			ScalarField::SecondaryStaff,
			ScalarField::SecondaryStaffCategory,
			ScalarField::EventCategory,
			ScalarField::Sex,
			ScalarField::Archetype,
			ScalarField::Region,
		];

		if SCALARS.iter().any(|field| self.scalar(*field).is_some()) {
			return true;
		}
		if self.diagnosis_codes.iter().any(|code| !code.trim().is_empty()) {
			return true;
		}
		if self.procedure_codes.iter().any(|code| !code.trim().is_empty()) {
			return true;
		}

		[&self.event_date, &self.end_date, &self.birth_date]
			.into_iter()
			.any(|value| value.as_deref().map(str::trim).filter(|raw| !raw.is_empty()).is_some())
	}
}

/// Criteria plus the values derived from the raw dates. `duration_days` keeps
/// an explicit unknown state — a missing end date is never the same as a
/// zero-day stay.
#[derive(Clone, Debug)]
pub struct NormalizedCriteria {
	pub criteria: SearchCriteria,
	pub age_years: i32,
	pub duration_days: Option<i64>,
	/// Event timestamp rendered for the store (`YYYY-MM-DD HH:MM:SS`), or the
	/// raw input when normalization failed.
	pub event_date_store: Option<String>,
	/// Birth date rendered for the store (`YYYY-MM-DD`), or the raw input when
	/// normalization failed.
	pub birth_date_store: Option<String>,
}
