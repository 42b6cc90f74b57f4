//! Billing enrichment on top of the cascade: per-match billing summaries and
//! the top-match cost estimate with real-time tariff recalculation.

use std::collections::HashMap;

use casematch_providers::pricing::{PricingContext, PricingItem};
use casematch_storage::models::BillingSummary;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
	CasematchService, CriteriaAnalysis, MatchResult, SearchRequest, ServiceResult, analysis,
	cascade::SearchOutcome,
};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct BillingItemView {
	pub billing_item_id: String,
	pub item_type: String,
	pub item_name: String,
	pub quantity: i32,
	pub item_net_amount: f64,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct BillingView {
	pub total_items: usize,
	pub total_amount: f64,
	pub item_types: Vec<String>,
	pub items: Vec<BillingItemView>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct MatchWithBilling {
	#[serde(flatten)]
	pub result: MatchResult,
	pub has_billing: bool,
	pub billing: Option<BillingView>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SearchWithBillingResponse {
	pub trace_id: Uuid,
	pub max_results: u32,
	pub total: usize,
	pub matches: Vec<MatchWithBilling>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct BillingAnalysisRequest {
	#[serde(flatten)]
	pub request: SearchRequest,
	/// Urgent-case marker, forwarded to the pricing engine as `is_cito`.
	#[serde(default)]
	pub urgency: bool,
	/// Pricing-engine patient category; historical default is 1.
	pub patient_category: Option<i64>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RepricedItem {
	pub billing_item_id: String,
	pub item_type: String,
	pub item_name: String,
	pub quantity: i32,
	pub historical_amount: f64,
	pub estimated_amount: f64,
	/// False when the pricing engine failed or omitted the item and the
	/// historical amount was kept.
	pub repriced: bool,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EstimatedBilling {
	pub admission_id: i64,
	pub total_items: usize,
	pub historical_total: f64,
	pub estimated_total: f64,
	pub items: Vec<RepricedItem>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct BillingAnalysis {
	pub trace_id: Uuid,
	pub matches: Vec<MatchResult>,
	/// Admission ids of every match, usable as billing references.
	pub billing_references: Vec<i64>,
	pub estimate: Option<EstimatedBilling>,
	pub criteria_analysis: Option<CriteriaAnalysis>,
}

impl From<BillingSummary> for BillingView {
	fn from(summary: BillingSummary) -> Self {
		Self {
			total_items: summary.total_items,
			total_amount: summary.total_amount,
			item_types: summary.item_types,
			items: summary
				.items
				.into_iter()
				.map(|item| BillingItemView {
					billing_item_id: item.billing_item_id,
					item_type: item.item_type,
					item_name: item.item_name,
					quantity: item.quantity,
					item_net_amount: item.item_net_amount,
				})
				.collect(),
		}
	}
}

fn round_cents(value: f64) -> f64 {
	(value * 100.).round() / 100.
}

impl CasematchService {
	/// Cascade search with each match enriched by its billing rollup. A
	/// billing lookup failure downgrades the match to `has_billing = false`
	/// instead of failing the search.
	pub async fn search_with_billing(
		&self,
		req: SearchRequest,
	) -> ServiceResult<SearchWithBillingResponse> {
		let outcome = self.search(req).await?;
		let mut matches = Vec::with_capacity(outcome.matches.len());

		for result in outcome.matches {
			let billing = match self.collaborators.billing.billing_for(result.admission_id).await {
				Ok(summary) => summary.map(BillingView::from),
				Err(err) => {
					tracing::warn!(
						trace_id = %outcome.trace_id,
						admission_id = result.admission_id,
						error = %err,
						"Billing lookup failed; returning match without billing.",
					);

					None
				},
			};

			matches.push(MatchWithBilling { has_billing: billing.is_some(), billing, result });
		}

		Ok(SearchWithBillingResponse {
			trace_id: outcome.trace_id,
			max_results: outcome.max_results,
			total: matches.len(),
			matches,
		})
	}

	/// Cost estimate for a new case: finds similar admissions, reprices the
	/// best match's billing items at current tariffs, and reports which
	/// criteria the best match actually honors.
	pub async fn billing_analysis(
		&self,
		req: BillingAnalysisRequest,
	) -> ServiceResult<BillingAnalysis> {
		let BillingAnalysisRequest { request, urgency, patient_category } = req;
		let criteria = request.criteria.clone();
		let outcome = self.search(request).await?;
		let SearchOutcome { trace_id, matches, .. } = outcome;
		let billing_references = matches.iter().map(|result| result.admission_id).collect();
		let Some(top) = matches.first() else {
			return Ok(BillingAnalysis {
				trace_id,
				matches,
				billing_references,
				estimate: None,
				criteria_analysis: None,
			});
		};
		let criteria_analysis = Some(analysis::analyze(&criteria, top));
		let summary = match self.collaborators.billing.billing_for(top.admission_id).await {
			Ok(summary) => summary,
			Err(err) => {
				tracing::warn!(
					%trace_id,
					admission_id = top.admission_id,
					error = %err,
					"Billing lookup failed; analysis proceeds without an estimate.",
				);

				None
			},
		};
		let estimate = match summary {
			Some(summary) =>
				Some(self.estimate(&trace_id, top, urgency, patient_category, summary).await),
			None => None,
		};

		Ok(BillingAnalysis { trace_id, matches, billing_references, estimate, criteria_analysis })
	}

	async fn estimate(
		&self,
		trace_id: &Uuid,
		top: &MatchResult,
		urgency: bool,
		patient_category: Option<i64>,
		summary: BillingSummary,
	) -> EstimatedBilling {
		let pricing_cfg =
			self.cfg.providers.as_ref().and_then(|providers| providers.pricing.as_ref());
		let recalculated: HashMap<String, f64> = match pricing_cfg {
			Some(cfg) => {
				let ctx = PricingContext {
					class_id: top.invoice_class_id,
					admission_type: top.event_category.clone(),
					transaction_date: top.event_date.clone(),
					patient_type_id: top.patient_category_id,
					patient_category: patient_category.unwrap_or(1),
					payer_id: top.payer_id,
					organization_id: top.facility_id,
					doctor_user_id: top.clinician_user_id,
					is_cito: urgency,
					start_date: top.event_date.clone(),
					end_date: top.end_date.clone(),
				};
				let items = summary
					.items
					.iter()
					.map(|item| PricingItem {
						billing_item_id: item.billing_item_id.clone(),
						quantity: item.quantity,
					})
					.collect::<Vec<_>>();

				match self.collaborators.pricing.recalculate(cfg, &ctx, &items).await {
					Ok(prices) => prices
						.into_iter()
						.map(|price| (price.billing_item_id, price.unit_price))
						.collect(),
					Err(err) => {
						tracing::warn!(
							%trace_id,
							error = %err,
							"Pricing recalculation failed; falling back to historical amounts.",
						);

						HashMap::new()
					},
				}
			},
			None => HashMap::new(),
		};
		let mut items = Vec::with_capacity(summary.items.len());
		let mut historical_total = 0.;
		let mut estimated_total = 0.;

		for item in summary.items {
			let (estimated_amount, repriced) = match recalculated.get(&item.billing_item_id) {
				Some(unit_price) => (round_cents(unit_price * f64::from(item.quantity)), true),
				None => (item.item_net_amount, false),
			};

			historical_total += item.item_net_amount;
			estimated_total += estimated_amount;
			items.push(RepricedItem {
				billing_item_id: item.billing_item_id,
				item_type: item.item_type,
				item_name: item.item_name,
				quantity: item.quantity,
				historical_amount: item.item_net_amount,
				estimated_amount,
				repriced,
			});
		}

		EstimatedBilling {
			admission_id: top.admission_id,
			total_items: items.len(),
			historical_total: round_cents(historical_total),
			estimated_total: round_cents(estimated_total),
			items,
		}
	}
}
