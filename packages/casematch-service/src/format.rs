//! Maps raw store rows into the fixed output schema. The difference and score
//! fields are stage-local and not comparable across stages.

use casematch_storage::models::AdmissionHit;
use serde::{Deserialize, Serialize};
use time::{Date, PrimitiveDateTime, macros::format_description};

const OUT_DATETIME: &[time::format_description::BorrowedFormatItem<'static>] =
	format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
const OUT_DATE: &[time::format_description::BorrowedFormatItem<'static>] =
	format_description!("[year]-[month]-[day]");

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct MatchResult {
	pub admission_id: i64,
	pub patient_id: i64,
	pub facility_code: String,
	pub facility_id: i64,
	pub event_category: String,
	pub event_category_id: i64,
	pub event_date: String,
	pub end_date: Option<String>,
	pub birth_date: String,
	pub sex: String,
	pub patient_category: String,
	pub patient_category_id: i64,
	pub clinician: String,
	pub clinician_user_id: i64,
	pub clinician_specialty: String,
	pub region: String,
	pub archetype: String,
	pub diagnosis_codes: String,
	pub procedure_codes: String,
	pub invoice_class: String,
	pub invoice_class_id: i64,
	pub payer_name: String,
	pub payer_id: i64,
	pub payer_category: String,
	pub invoice_net_amount: f64,
	pub age: i32,
	pub duration_days: Option<i32>,
	pub secondary_staff: String,
	pub secondary_staff_category: String,
	/// Originating cascade stage, 1-17.
	pub stage: u8,
	pub age_diff: i64,
	pub date_diff: i64,
	pub duration_diff: i64,
	pub diagnosis_score: f64,
	pub procedure_score: f64,
}

pub(crate) fn render_datetime(value: PrimitiveDateTime) -> String {
	value.format(OUT_DATETIME).unwrap_or_default()
}

pub(crate) fn render_date(value: Date) -> String {
	value.format(OUT_DATE).unwrap_or_default()
}

impl MatchResult {
	pub fn from_hit(stage: u8, hit: AdmissionHit) -> Self {
		Self {
			admission_id: hit.admission_id,
			patient_id: hit.patient_id,
			facility_code: hit.facility_code,
			facility_id: hit.facility_id,
			event_category: hit.event_category,
			event_category_id: hit.event_category_id,
			event_date: render_datetime(hit.event_date),
			end_date: hit.end_date.map(render_datetime),
			birth_date: render_date(hit.birth_date),
			sex: hit.sex,
			patient_category: hit.patient_category,
			patient_category_id: hit.patient_category_id,
			clinician: hit.clinician,
			clinician_user_id: hit.clinician_user_id,
			clinician_specialty: hit.clinician_specialty,
			region: hit.region,
			archetype: hit.archetype,
			diagnosis_codes: hit.diagnosis_codes,
			procedure_codes: hit.procedure_codes,
			invoice_class: hit.invoice_class,
			invoice_class_id: hit.invoice_class_id,
			payer_name: hit.payer_name,
			payer_id: hit.payer_id,
			payer_category: hit.payer_category,
			invoice_net_amount: hit.invoice_net_amount,
			age: hit.age,
			duration_days: hit.duration_days,
			secondary_staff: hit.secondary_staff,
			secondary_staff_category: hit.secondary_staff_category,
			stage,
			age_diff: hit.age_diff,
			date_diff: hit.date_diff,
			duration_diff: hit.duration_diff,
			diagnosis_score: hit.diagnosis_score,
			procedure_score: hit.procedure_score,
		}
	}
}
