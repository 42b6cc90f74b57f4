use time::{
	Date, OffsetDateTime, PrimitiveDateTime, UtcOffset, format_description::well_known::Iso8601,
	macros::format_description,
};

use crate::criteria::{NormalizedCriteria, SearchCriteria};

const STORE_DATETIME: &[time::format_description::BorrowedFormatItem<'static>] =
	format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
const STORE_DATE: &[time::format_description::BorrowedFormatItem<'static>] =
	format_description!("[year]-[month]-[day]");

#[derive(Debug, thiserror::Error)]
pub enum DateParseError {
	#[error("Missing {field}.")]
	Missing { field: &'static str },
	#[error("Unparseable {field}: {raw:?}.")]
	Unparseable { field: &'static str, raw: String },
	#[error("Failed to render {field} for the store.")]
	Render { field: &'static str },
}

/// Derives age-at-event and stay-duration from the raw criteria dates.
///
/// Normalization never fails the request: any parse failure is logged and the
/// derived values fall back to age 0 and unknown duration, with the raw date
/// strings passed through untouched.
pub fn normalize(criteria: SearchCriteria) -> NormalizedCriteria {
	match derive(&criteria) {
		Ok(derived) => NormalizedCriteria {
			criteria,
			age_years: derived.age_years,
			duration_days: derived.duration_days,
			event_date_store: Some(derived.event_date_store),
			birth_date_store: Some(derived.birth_date_store),
		},
		Err(err) => {
			tracing::warn!(error = %err, "Date normalization failed; falling back to defaults.");

			let event_date_store = criteria.event_date.clone();
			let birth_date_store = criteria.birth_date.clone();

			NormalizedCriteria {
				criteria,
				age_years: 0,
				duration_days: None,
				event_date_store,
				birth_date_store,
			}
		},
	}
}

struct Derived {
	age_years: i32,
	duration_days: Option<i64>,
	event_date_store: String,
	birth_date_store: String,
}

fn derive(criteria: &SearchCriteria) -> Result<Derived, DateParseError> {
	let event_raw = non_empty(criteria.event_date.as_deref())
		.ok_or(DateParseError::Missing { field: "event date" })?;
	let birth_raw = non_empty(criteria.birth_date.as_deref())
		.ok_or(DateParseError::Missing { field: "birth date" })?;
	let event = parse_event_datetime(event_raw).ok_or_else(|| DateParseError::Unparseable {
		field: "event date",
		raw: event_raw.to_string(),
	})?;
	let birth = parse_plain_date(birth_raw).ok_or_else(|| DateParseError::Unparseable {
		field: "birth date",
		raw: birth_raw.to_string(),
	})?;
	let duration_days = match non_empty(criteria.end_date.as_deref()) {
		Some(end_raw) => {
			let end = parse_event_datetime(end_raw).ok_or_else(|| DateParseError::Unparseable {
				field: "end date",
				raw: end_raw.to_string(),
			})?;

			Some((end.date() - event.date()).whole_days())
		},
		None => None,
	};
	let event_date_store = event
		.format(STORE_DATETIME)
		.map_err(|_| DateParseError::Render { field: "event date" })?;
	let birth_date_store =
		birth.format(STORE_DATE).map_err(|_| DateParseError::Render { field: "birth date" })?;

	Ok(Derived {
		age_years: age_at_event(event.date(), birth),
		duration_days,
		event_date_store,
		birth_date_store,
	})
}

/// Floor age in whole years at the event date. One year is subtracted when the
/// event falls before the birthday in its calendar year; never rounded up.
pub fn age_at_event(event: Date, birth: Date) -> i32 {
	let mut age = event.year() - birth.year();

	if (event.month() as u8, event.day()) < (birth.month() as u8, birth.day()) {
		age -= 1;
	}

	age
}

/// Parses an event timestamp in either ISO-8601 (optional trailing `Z`) or the
/// secondary `YYYY-MM-DD HH:MM:SS` form.
pub fn parse_event_datetime(raw: &str) -> Option<PrimitiveDateTime> {
	let trimmed = raw.trim();

	if trimmed.contains('T') || trimmed.contains('Z') {
		if let Ok(parsed) = OffsetDateTime::parse(trimmed, &Iso8601::DEFAULT) {
			let utc = parsed.to_offset(UtcOffset::UTC);

			return Some(PrimitiveDateTime::new(utc.date(), utc.time()));
		}

		return PrimitiveDateTime::parse(trimmed, &Iso8601::DEFAULT).ok();
	}

	PrimitiveDateTime::parse(trimmed, STORE_DATETIME).ok()
}

/// Parses a plain `YYYY-MM-DD` date.
pub fn parse_plain_date(raw: &str) -> Option<Date> {
	Date::parse(raw.trim(), STORE_DATE).ok()
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
	raw.map(str::trim).filter(|value| !value.is_empty())
}
