//! The step catalog: 17 immutable stage descriptors for the relaxation
//! cascade. Each stage is a complete filter + score + sort specification;
//! the driver and the query layer consume them as pure data.

use crate::criteria::ScalarField;

/// How a stage matches the diagnosis and procedure code families.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CodeMode {
	/// Both families: stored column equals the input codes joined with `;` in
	/// the input's order. Order-sensitive by design.
	Exact,
	/// Both families: per-code substring match, any hit counts; score is the
	/// matched-code count plus the over-broad penalty.
	Partial,
	/// Procedure exact, diagnosis partial; both families score count-based.
	Mixed,
	/// Diagnosis ignored entirely; procedure exact with a boolean score.
	ProcedureOnlyExact,
	/// Diagnosis ignored entirely; procedure partial with a count-based score.
	ProcedureOnlyPartial,
}

/// One key of a stage's composite ordering. Priority keys sort matching
/// records first (0 before 1); difference keys sort ascending; score keys
/// sort descending.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SortKey {
	ProcedureScoreDesc,
	DiagnosisScoreDesc,
	Priority(ScalarField),
	AgeDiff,
	DurationDiff,
	DateDiff,
}

/// Declarative description of one cascade stage.
#[derive(Debug)]
pub struct StageSpec {
	pub ordinal: u8,
	pub code_mode: CodeMode,
	pub scalar_filters: &'static [ScalarField],
	/// Whether the stage filters duration by strict equality. From stage 5 on
	/// duration is only a difference-based sort key.
	pub duration_filter: bool,
	pub sort_keys: &'static [SortKey],
}

impl StageSpec {
	pub fn filters_on(&self, field: ScalarField) -> bool {
		self.scalar_filters.contains(&field)
	}
}

/// Joins input codes for exact matching, preserving the caller's order.
pub fn join_exact(codes: &[String]) -> String {
	codes.iter().map(|code| code.trim()).collect::<Vec<_>>().join(";")
}

const DIFFS: [SortKey; 3] = [SortKey::AgeDiff, SortKey::DurationDiff, SortKey::DateDiff];

const SORT_TIGHT: &[SortKey] = &[SortKey::AgeDiff, SortKey::DateDiff];
const SORT_SEX: &[SortKey] = &[SortKey::Priority(ScalarField::Sex), DIFFS[0], DIFFS[1], DIFFS[2]];
const SORT_EVENT_SEX: &[SortKey] = &[
	SortKey::Priority(ScalarField::EventCategory),
	SortKey::Priority(ScalarField::Sex),
	DIFFS[0],
	DIFFS[1],
	DIFFS[2],
];
const SORT_CLINICIAN_CHAIN: &[SortKey] = &[
	SortKey::Priority(ScalarField::Clinician),
	SortKey::Priority(ScalarField::EventCategory),
	SortKey::Priority(ScalarField::Sex),
	DIFFS[0],
	DIFFS[1],
	DIFFS[2],
];
const SORT_PAYER_CHAIN: &[SortKey] = &[
	SortKey::Priority(ScalarField::PayerName),
	SortKey::Priority(ScalarField::PayerCategory),
	SortKey::Priority(ScalarField::Clinician),
	SortKey::Priority(ScalarField::EventCategory),
	SortKey::Priority(ScalarField::Sex),
	DIFFS[0],
	DIFFS[1],
	DIFFS[2],
];
const SORT_PLACE_CHAIN: &[SortKey] = &[
	SortKey::Priority(ScalarField::Facility),
	SortKey::Priority(ScalarField::Region),
	SortKey::Priority(ScalarField::Archetype),
	SortKey::Priority(ScalarField::Clinician),
	SortKey::Priority(ScalarField::EventCategory),
	SortKey::Priority(ScalarField::Sex),
	DIFFS[0],
	DIFFS[1],
	DIFFS[2],
];
const SORT_MIXED: &[SortKey] =
	&[SortKey::ProcedureScoreDesc, SortKey::DiagnosisScoreDesc, DIFFS[0], DIFFS[1], DIFFS[2]];
const SORT_PROCEDURE: &[SortKey] = &[SortKey::ProcedureScoreDesc, DIFFS[0], DIFFS[1], DIFFS[2]];

/// The full cascade, ordinals 1-17, executed strictly in this order. Field
/// drops and swaps are cumulative along the sequence.
pub const STAGES: [StageSpec; 17] = [
	StageSpec {
		ordinal: 1,
		code_mode: CodeMode::Exact,
		scalar_filters: &[
			ScalarField::Facility,
			ScalarField::PayerName,
			ScalarField::Clinician,
			ScalarField::EventCategory,
			ScalarField::Sex,
			ScalarField::SecondaryStaff,
			ScalarField::SecondaryStaffCategory,
		],
		duration_filter: true,
		sort_keys: SORT_TIGHT,
	},
	StageSpec {
		ordinal: 2,
		code_mode: CodeMode::Exact,
		scalar_filters: &[
			ScalarField::Facility,
			ScalarField::PayerName,
			ScalarField::Clinician,
			ScalarField::EventCategory,
			ScalarField::Sex,
			ScalarField::SecondaryStaffCategory,
		],
		duration_filter: true,
		sort_keys: SORT_TIGHT,
	},
	StageSpec {
		ordinal: 3,
		code_mode: CodeMode::Exact,
		scalar_filters: &[
			ScalarField::Facility,
			ScalarField::PayerName,
			ScalarField::Clinician,
			ScalarField::EventCategory,
			ScalarField::Sex,
		],
		duration_filter: true,
		sort_keys: SORT_TIGHT,
	},
	StageSpec {
		ordinal: 4,
		code_mode: CodeMode::Exact,
		scalar_filters: &[
			ScalarField::Facility,
			ScalarField::PayerName,
			ScalarField::Clinician,
			ScalarField::EventCategory,
		],
		duration_filter: true,
		sort_keys: SORT_TIGHT,
	},
	StageSpec {
		ordinal: 5,
		code_mode: CodeMode::Exact,
		scalar_filters: &[ScalarField::Facility, ScalarField::PayerName, ScalarField::Clinician],
		duration_filter: false,
		sort_keys: SORT_SEX,
	},
	StageSpec {
		ordinal: 6,
		code_mode: CodeMode::Exact,
		scalar_filters: &[ScalarField::Facility, ScalarField::PayerName, ScalarField::Clinician],
		duration_filter: false,
		sort_keys: SORT_EVENT_SEX,
	},
	StageSpec {
		ordinal: 7,
		code_mode: CodeMode::Exact,
		scalar_filters: &[
			ScalarField::Facility,
			ScalarField::PayerName,
			ScalarField::ClinicianSpecialty,
		],
		duration_filter: false,
		sort_keys: SORT_EVENT_SEX,
	},
	StageSpec {
		ordinal: 8,
		code_mode: CodeMode::Exact,
		scalar_filters: &[ScalarField::Facility, ScalarField::PayerName],
		duration_filter: false,
		sort_keys: SORT_EVENT_SEX,
	},
	StageSpec {
		ordinal: 9,
		code_mode: CodeMode::Exact,
		scalar_filters: &[ScalarField::Facility, ScalarField::PayerCategory],
		duration_filter: false,
		sort_keys: SORT_CLINICIAN_CHAIN,
	},
	StageSpec {
		ordinal: 10,
		code_mode: CodeMode::Exact,
		scalar_filters: &[ScalarField::Facility],
		duration_filter: false,
		sort_keys: SORT_CLINICIAN_CHAIN,
	},
	StageSpec {
		ordinal: 11,
		code_mode: CodeMode::Exact,
		scalar_filters: &[ScalarField::Archetype],
		duration_filter: false,
		sort_keys: SORT_PAYER_CHAIN,
	},
	StageSpec {
		ordinal: 12,
		code_mode: CodeMode::Exact,
		scalar_filters: &[ScalarField::Archetype],
		duration_filter: false,
		sort_keys: SORT_CLINICIAN_CHAIN,
	},
	StageSpec {
		ordinal: 13,
		code_mode: CodeMode::Exact,
		scalar_filters: &[ScalarField::Region],
		duration_filter: false,
		sort_keys: SORT_CLINICIAN_CHAIN,
	},
	StageSpec {
		ordinal: 14,
		code_mode: CodeMode::Exact,
		scalar_filters: &[],
		duration_filter: false,
		sort_keys: SORT_PLACE_CHAIN,
	},
	StageSpec {
		ordinal: 15,
		code_mode: CodeMode::Mixed,
		scalar_filters: &[],
		duration_filter: false,
		sort_keys: SORT_MIXED,
	},
	StageSpec {
		ordinal: 16,
		code_mode: CodeMode::ProcedureOnlyExact,
		scalar_filters: &[],
		duration_filter: false,
		sort_keys: SORT_PROCEDURE,
	},
	StageSpec {
		ordinal: 17,
		code_mode: CodeMode::ProcedureOnlyPartial,
		scalar_filters: &[],
		duration_filter: false,
		sort_keys: SORT_PROCEDURE,
	},
];
