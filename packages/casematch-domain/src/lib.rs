pub mod criteria;
pub mod normalize;
pub mod stages;

pub use criteria::{NormalizedCriteria, ScalarField, SearchCriteria};
pub use normalize::{
	DateParseError, age_at_event, normalize, parse_event_datetime, parse_plain_date,
};
pub use stages::{CodeMode, STAGES, SortKey, StageSpec, join_exact};
