//! The relaxation driver: walks the stage catalog in order, excluding already
//! captured admissions, and halts as soon as enough distinct matches
//! accumulate.

use std::{collections::HashSet, time::Duration};

use casematch_domain::{STAGES, SearchCriteria, normalize};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CasematchService, MatchResult, ServiceError, ServiceResult};

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct SearchRequest {
	#[serde(flatten)]
	pub criteria: SearchCriteria,
	pub max_results: Option<u32>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SearchOutcome {
	pub trace_id: Uuid,
	pub max_results: u32,
	pub total: usize,
	pub matches: Vec<MatchResult>,
}

impl CasematchService {
	/// Runs the full 17-stage cascade. Fewer matches than requested is a
	/// normal partial outcome, not an error.
	pub async fn search(&self, req: SearchRequest) -> ServiceResult<SearchOutcome> {
		if !req.criteria.has_any() {
			return Err(ServiceError::InvalidRequest {
				message: "At least one criteria field must be non-empty.".to_string(),
			});
		}

		let search_cfg = &self.cfg.search;
		let max_results = req
			.max_results
			.unwrap_or(search_cfg.default_max_results)
			.clamp(1, search_cfg.max_results_cap);
		let trace_id = Uuid::new_v4();
		let norm = normalize(req.criteria);
		let mut seen = HashSet::new();
		let mut exclude: Vec<i64> = Vec::new();
		let mut matches: Vec<MatchResult> = Vec::new();

		for stage in &STAGES {
			if matches.len() >= max_results as usize {
				break;
			}

			let fut = self.collaborators.executor.run_stage(
				&norm,
				stage,
				&exclude,
				search_cfg.stage_row_limit as i64,
				search_cfg.overbroad_penalty,
			);
			let outcome = match search_cfg.stage_timeout_ms {
				Some(ms) => match tokio::time::timeout(Duration::from_millis(ms), fut).await {
					Ok(outcome) => outcome,
					Err(_) => Err(color_eyre::eyre::eyre!("Stage query deadline exceeded.")),
				},
				None => fut.await,
			};
			let rows = match outcome {
				Ok(rows) => rows,
				Err(err) => {
					tracing::warn!(
						%trace_id,
						stage = stage.ordinal,
						error = %err,
						"Stage execution failed; skipping stage.",
					);

					continue;
				},
			};

			for row in rows {
				if !seen.insert(row.admission_id) {
					continue;
				}

				exclude.push(row.admission_id);
				matches.push(MatchResult::from_hit(stage.ordinal, row));

				if matches.len() >= max_results as usize {
					break;
				}
			}
		}

		// Stages already run in ascending order; the stable sort pins the
		// invariant even if a future executor returns out of band.
		matches.sort_by_key(|result| result.stage);
		matches.truncate(max_results as usize);

		Ok(SearchOutcome { trace_id, max_results, total: matches.len(), matches })
	}
}
