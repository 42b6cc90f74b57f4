//! Parametrized stage queries. Every stage descriptor compiles to one SELECT
//! over `admissions`; all caller values travel as bind parameters.

use casematch_domain::{
	CodeMode, NormalizedCriteria, ScalarField, SortKey, StageSpec, join_exact, parse_event_datetime,
};
use sqlx::{Postgres, QueryBuilder};

const ADMISSION_COLUMNS: &str = "admission_id, patient_id, facility_code, facility_id, \
	event_category, event_category_id, event_date, end_date, birth_date, sex, patient_category, \
	patient_category_id, clinician, clinician_user_id, clinician_specialty, region, archetype, \
	diagnosis_codes, procedure_codes, invoice_class, invoice_class_id, payer_name, payer_id, \
	payer_category, invoice_net_amount, age, duration_days, secondary_staff, \
	secondary_staff_category";

fn scalar_column(field: ScalarField) -> &'static str {
	match field {
		ScalarField::Facility => "facility_code",
		ScalarField::PayerName => "payer_name",
		ScalarField::PayerCategory => "payer_category",
		ScalarField::Clinician => "clinician",
		ScalarField::ClinicianSpecialty => "clinician_specialty",
		ScalarField::SecondaryStaff => "secondary_staff",
		ScalarField::SecondaryStaffCategory => "secondary_staff_category",
		ScalarField::EventCategory => "event_category",
		ScalarField::Sex => "sex",
		ScalarField::Archetype => "archetype",
		ScalarField::Region => "region",
	}
}

fn priority_alias(field: ScalarField) -> &'static str {
	match field {
		ScalarField::Facility => "facility_priority",
		ScalarField::PayerName => "payer_name_priority",
		ScalarField::PayerCategory => "payer_category_priority",
		ScalarField::Clinician => "clinician_priority",
		ScalarField::ClinicianSpecialty => "clinician_specialty_priority",
		ScalarField::SecondaryStaff => "secondary_staff_priority",
		ScalarField::SecondaryStaffCategory => "secondary_staff_category_priority",
		ScalarField::EventCategory => "event_category_priority",
		ScalarField::Sex => "sex_priority",
		ScalarField::Archetype => "archetype_priority",
		ScalarField::Region => "region_priority",
	}
}

fn trimmed_codes(codes: &[String]) -> Vec<String> {
	codes.iter().map(|code| code.trim().to_string()).filter(|code| !code.is_empty()).collect()
}

/// Count-based score for a substring-matched code family: one point per
/// requested code found in the stored delimited list, minus the over-broad
/// penalty when the stored list carries more codes than were requested.
fn push_count_score(
	builder: &mut QueryBuilder<'static, Postgres>,
	column: &str,
	codes: &[String],
	penalty: f64,
) {
	builder.push("(");

	for (i, code) in codes.iter().enumerate() {
		if i > 0 {
			builder.push(" + ");
		}

		builder.push(format!("CASE WHEN {column} LIKE "));
		builder.push_bind(format!("%{code}%"));
		builder.push(" THEN 1 ELSE 0 END");
	}

	builder.push(format!(
		")::float8 + CASE WHEN length({column}) - length(replace({column}, ';', '')) + 1 > {} \
		 THEN ",
		codes.len()
	));
	builder.push_bind(penalty);
	builder.push(" ELSE 0 END");
}

fn push_like_filter(
	builder: &mut QueryBuilder<'static, Postgres>,
	column: &str,
	codes: &[String],
) {
	builder.push(" AND (");

	for (i, code) in codes.iter().enumerate() {
		if i > 0 {
			builder.push(" OR ");
		}

		builder.push(format!("{column} LIKE "));
		builder.push_bind(format!("%{code}%"));
	}

	builder.push(")");
}

fn push_exact_filter(
	builder: &mut QueryBuilder<'static, Postgres>,
	column: &str,
	codes: &[String],
) {
	builder.push(format!(" AND {column} = "));
	builder.push_bind(join_exact(codes));
}

/// Builds the SELECT for one cascade stage. The exclusion list is always
/// applied (vacuously on the first stage); every criteria-derived value is a
/// bind parameter, never interpolated text.
pub fn build_stage_query(
	norm: &NormalizedCriteria,
	stage: &StageSpec,
	exclude: &[i64],
	limit: i64,
	overbroad_penalty: f64,
) -> QueryBuilder<'static, Postgres> {
	let diagnosis = trimmed_codes(&norm.criteria.diagnosis_codes);
	let procedure = trimmed_codes(&norm.criteria.procedure_codes);
	let event_store = norm
		.event_date_store
		.as_deref()
		.filter(|raw| parse_event_datetime(raw).is_some())
		.map(str::to_string);
	let mut builder = QueryBuilder::new(format!("SELECT {ADMISSION_COLUMNS}, "));

	// diagnosis_score
	match stage.code_mode {
		CodeMode::Exact if !diagnosis.is_empty() => {
			builder.push("1::float8");
		},
		CodeMode::Partial | CodeMode::Mixed if !diagnosis.is_empty() => {
			push_count_score(&mut builder, "diagnosis_codes", &diagnosis, overbroad_penalty);
		},
		_ => {
			builder.push("0::float8");
		},
	}

	builder.push(" AS diagnosis_score, ");

	// procedure_score
	match stage.code_mode {
		CodeMode::Exact | CodeMode::ProcedureOnlyExact if !procedure.is_empty() => {
			builder.push("1::float8");
		},
		CodeMode::Partial | CodeMode::Mixed | CodeMode::ProcedureOnlyPartial
			if !procedure.is_empty() =>
		{
			push_count_score(&mut builder, "procedure_codes", &procedure, overbroad_penalty);
		},
		_ => {
			builder.push("0::float8");
		},
	}

	builder.push(" AS procedure_score, ");
	builder.push("ABS(age - ");
	builder.push_bind(norm.age_years);
	builder.push(")::int8 AS age_diff, ");

	match &event_store {
		Some(event) => {
			builder.push("ABS(event_date::date - (");
			builder.push_bind(event.clone());
			builder.push(")::timestamp::date)::int8 AS date_diff, ");
		},
		None => {
			builder.push("0::int8 AS date_diff, ");
		},
	}
	match norm.duration_days {
		Some(duration) => {
			builder.push("ABS(COALESCE(duration_days, 0) - ");
			builder.push_bind(duration);
			builder.push(")::int8 AS duration_diff");
		},
		None => {
			builder.push("0::int8 AS duration_diff");
		},
	}

	// Priority tie-break columns, only for the keys this stage sorts by.
	for key in stage.sort_keys {
		if let SortKey::Priority(field) = key {
			let alias = priority_alias(*field);

			match norm.criteria.scalar(*field) {
				Some(value) => {
					builder.push(format!(", CASE WHEN {} = ", scalar_column(*field)));
					builder.push_bind(value.to_string());
					builder.push(format!(" THEN 0 ELSE 1 END AS {alias}"));
				},
				None => {
					builder.push(format!(", 1 AS {alias}"));
				},
			}
		}
	}

	builder.push(" FROM admissions WHERE admission_id <> ALL(");
	builder.push_bind(exclude.to_vec());
	builder.push(")");

	match stage.code_mode {
		CodeMode::Exact => {
			if !diagnosis.is_empty() {
				push_exact_filter(&mut builder, "diagnosis_codes", &diagnosis);
			}
			if !procedure.is_empty() {
				push_exact_filter(&mut builder, "procedure_codes", &procedure);
			}
		},
		CodeMode::Partial => {
			if !diagnosis.is_empty() {
				push_like_filter(&mut builder, "diagnosis_codes", &diagnosis);
			}
			if !procedure.is_empty() {
				push_like_filter(&mut builder, "procedure_codes", &procedure);
			}
		},
		CodeMode::Mixed => {
			if !diagnosis.is_empty() {
				push_like_filter(&mut builder, "diagnosis_codes", &diagnosis);
			}
			if !procedure.is_empty() {
				push_exact_filter(&mut builder, "procedure_codes", &procedure);
			}
		},
		CodeMode::ProcedureOnlyExact =>
			if !procedure.is_empty() {
				push_exact_filter(&mut builder, "procedure_codes", &procedure);
			},
		CodeMode::ProcedureOnlyPartial =>
			if !procedure.is_empty() {
				push_like_filter(&mut builder, "procedure_codes", &procedure);
			},
	}

	for field in stage.scalar_filters {
		if let Some(value) = norm.criteria.scalar(*field) {
			builder.push(format!(" AND {} = ", scalar_column(*field)));
			builder.push_bind(value.to_string());
		}
	}
	if stage.duration_filter
		&& let Some(duration) = norm.duration_days
	{
		builder.push(" AND duration_days = ");
		builder.push_bind(duration);
	}

	builder.push(" ORDER BY ");

	for (i, key) in stage.sort_keys.iter().enumerate() {
		if i > 0 {
			builder.push(", ");
		}
		match key {
			SortKey::ProcedureScoreDesc => {
				builder.push("procedure_score DESC");
			},
			SortKey::DiagnosisScoreDesc => {
				builder.push("diagnosis_score DESC");
			},
			SortKey::Priority(field) => {
				builder.push(format!("{} ASC", priority_alias(*field)));
			},
			SortKey::AgeDiff => {
				builder.push("age_diff ASC");
			},
			SortKey::DurationDiff => {
				builder.push("duration_diff ASC");
			},
			SortKey::DateDiff => {
				builder.push("date_diff ASC");
			},
		}
	}

	builder.push(format!(" LIMIT {limit}"));

	builder
}

#[cfg(test)]
mod tests {
	use casematch_domain::{STAGES, SearchCriteria, normalize};

	use super::*;

	fn sample() -> NormalizedCriteria {
		normalize(SearchCriteria {
			facility: Some("RSUA".into()),
			payer_name: Some("ACME HEALTH".into()),
			clinician: Some("dr. Sari".into()),
			event_category: Some("Inpatient".into()),
			sex: Some("F".into()),
			diagnosis_codes: vec!["A09".into(), "E11.9".into()],
			procedure_codes: vec!["99.18".into()],
			event_date: Some("2024-03-10T08:30:00Z".into()),
			end_date: Some("2024-03-13T10:00:00Z".into()),
			birth_date: Some("1980-05-20".into()),
			..Default::default()
		})
	}

	#[test]
	fn stage_one_filters_duration_and_exact_codes() {
		let mut builder = build_stage_query(&sample(), &STAGES[0], &[], 50, -0.1);
		let sql = builder.sql().to_string();

		assert!(sql.contains("diagnosis_codes = "));
		assert!(sql.contains("procedure_codes = "));
		assert!(sql.contains("duration_days = "));
		assert!(sql.contains("facility_code = "));
		assert!(sql.contains("sex = "));
		assert!(!sql.contains("LIKE"));
		assert!(sql.ends_with("LIMIT 50"));
	}

	#[test]
	fn stage_five_drops_duration_filter_but_keeps_duration_sort() {
		let mut builder = build_stage_query(&sample(), &STAGES[4], &[], 50, -0.1);
		let sql = builder.sql().to_string();

		assert!(!sql.contains("duration_days = "));
		assert!(sql.contains("duration_diff ASC"));
		assert!(sql.contains("sex_priority ASC"));
	}

	#[test]
	fn exclusion_is_always_present() {
		let mut builder = build_stage_query(&sample(), &STAGES[0], &[7, 9], 50, -0.1);
		let sql = builder.sql().to_string();

		assert!(sql.contains("admission_id <> ALL("));
	}

	#[test]
	fn mixed_stage_keeps_procedure_exact_and_diagnosis_partial() {
		let mut builder = build_stage_query(&sample(), &STAGES[14], &[], 50, -0.1);
		let sql = builder.sql().to_string();

		assert!(sql.contains("procedure_codes = "));
		assert!(sql.contains("diagnosis_codes LIKE "));
		assert!(sql.contains("procedure_score DESC, diagnosis_score DESC"));
		// All scalar filters are gone by stage 15.
		assert!(!sql.contains("facility_code = "));
		assert!(!sql.contains(" sex = "));
	}

	#[test]
	fn procedure_only_stages_ignore_diagnosis() {
		let mut exact = build_stage_query(&sample(), &STAGES[15], &[], 50, -0.1);
		let exact_sql = exact.sql().to_string();
		let mut partial = build_stage_query(&sample(), &STAGES[16], &[], 50, -0.1);
		let partial_sql = partial.sql().to_string();

		assert!(exact_sql.contains("procedure_codes = "));
		assert!(!exact_sql.contains("diagnosis_codes = "));
		assert!(!exact_sql.contains("diagnosis_codes LIKE "));
		assert!(partial_sql.contains("procedure_codes LIKE "));
		assert!(!partial_sql.contains("diagnosis_codes LIKE "));
	}

	#[test]
	fn partial_score_carries_overbroad_penalty_guard() {
		let mut builder = build_stage_query(&sample(), &STAGES[16], &[], 50, -0.1);
		let sql = builder.sql().to_string();

		assert!(sql.contains(
			"length(procedure_codes) - length(replace(procedure_codes, ';', '')) + 1 > 1"
		));
	}

	#[test]
	fn absent_criteria_skip_filters_and_demote_priorities() {
		let norm = normalize(SearchCriteria {
			diagnosis_codes: vec!["A09".into()],
			..Default::default()
		});
		let mut builder = build_stage_query(&norm, &STAGES[4], &[], 50, -0.1);
		let sql = builder.sql().to_string();

		assert!(!sql.contains("facility_code = "));
		assert!(sql.contains("1 AS sex_priority"));
		assert!(sql.contains("0::int8 AS date_diff"));
	}

	#[test]
	fn unparseable_event_date_falls_back_to_zero_date_diff() {
		let norm = normalize(SearchCriteria {
			diagnosis_codes: vec!["A09".into()],
			event_date: Some("not-a-date".into()),
			birth_date: Some("1980-05-20".into()),
			..Default::default()
		});
		let mut builder = build_stage_query(&norm, &STAGES[0], &[], 50, -0.1);
		let sql = builder.sql().to_string();

		assert!(sql.contains("0::int8 AS date_diff"));
	}
}
