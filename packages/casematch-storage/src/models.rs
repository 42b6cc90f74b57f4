use time::{Date, PrimitiveDateTime};

/// One admission row together with the stage-computed score and difference
/// columns. The computed columns are only comparable within the stage that
/// produced them.
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct AdmissionHit {
	pub admission_id: i64,
	pub patient_id: i64,
	pub facility_code: String,
	pub facility_id: i64,
	pub event_category: String,
	pub event_category_id: i64,
	pub event_date: PrimitiveDateTime,
	pub end_date: Option<PrimitiveDateTime>,
	pub birth_date: Date,
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
	pub diagnosis_score: f64,
	pub procedure_score: f64,
	pub age_diff: i64,
	pub date_diff: i64,
	pub duration_diff: i64,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct BillingItemRow {
	pub admission_id: i64,
	pub billing_item_id: String,
	pub item_type: String,
	pub item_name: String,
	pub quantity: i32,
	pub item_net_amount: f64,
}

/// Per-admission billing rollup assembled from `billing_items`.
#[derive(Clone, Debug)]
pub struct BillingSummary {
	pub admission_id: i64,
	pub total_items: usize,
	pub total_amount: f64,
	pub item_types: Vec<String>,
	pub items: Vec<BillingItemRow>,
}
