//! Real-time tariff recalculation against the external pricing service.
//! Upstream deployments disagree on the response envelope, so parsing probes
//! the known shapes instead of pinning one.

use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

/// Invoice-level context sent alongside the items. `previewed` is always true:
/// recalculation must never post anything upstream.
#[derive(Clone, Debug, Serialize)]
pub struct PricingContext {
	pub class_id: i64,
	pub admission_type: String,
	pub transaction_date: String,
	pub patient_type_id: i64,
	pub patient_category: i64,
	pub payer_id: i64,
	pub organization_id: i64,
	pub doctor_user_id: i64,
	pub is_cito: bool,
	pub start_date: String,
	pub end_date: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct PricingItem {
	pub billing_item_id: String,
	pub quantity: i32,
}

/// One repriced item. `unit_price` is the current tariff for a single unit.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemPrice {
	pub billing_item_id: String,
	pub unit_price: f64,
}

pub async fn recalculate(
	cfg: &casematch_config::PricingProviderConfig,
	ctx: &PricingContext,
	items: &[PricingItem],
) -> Result<Vec<ItemPrice>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"class_id": ctx.class_id,
		"admission_type": ctx.admission_type,
		"transaction_date": ctx.transaction_date,
		"patient_type_id": ctx.patient_type_id,
		"patient_category": ctx.patient_category,
		"payer_id": ctx.payer_id,
		"organization_id": ctx.organization_id,
		"previewed": true,
		"sales_items": items
			.iter()
			.map(|item| {
				serde_json::json!({
					"billing_item_id": item.billing_item_id,
					"quantity": item.quantity,
					"start_date": ctx.start_date,
					"end_date": ctx.end_date,
					"doctor_user_id": ctx.doctor_user_id,
					"is_cito": ctx.is_cito,
					"edited_sales_price": Value::Null,
					"is_default_sales_price": true,
				})
			})
			.collect::<Vec<_>>(),
	});
	let res = client.post(&url).json(&body).send().await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_pricing_response(json)
}

pub fn parse_pricing_response(json: Value) -> Result<Vec<ItemPrice>> {
	let Some(entries) = item_array(&json) else {
		return Err(eyre::eyre!("Pricing response carries no item list."));
	};
	let mut prices = Vec::with_capacity(entries.len());

	for entry in entries {
		let Some(id) = item_id(entry) else {
			continue;
		};
		let Some(unit_price) = item_unit_price(entry) else {
			continue;
		};

		prices.push(ItemPrice { billing_item_id: id, unit_price });
	}

	Ok(prices)
}

fn item_array(json: &Value) -> Option<&Vec<Value>> {
	if let Some(list) = json.as_array() {
		return Some(list);
	}

	let data = json.get("data");

	for candidate in [
		data.and_then(Value::as_array),
		data.and_then(|value| value.get("sales_items")).and_then(Value::as_array),
		data.and_then(|value| value.get("items")).and_then(Value::as_array),
		json.get("sales_items").and_then(Value::as_array),
		json.get("items").and_then(Value::as_array),
	] {
		if let Some(list) = candidate {
			return Some(list);
		}
	}

	None
}

fn item_id(entry: &Value) -> Option<String> {
	for key in ["billing_item_id", "item_id", "id"] {
		match entry.get(key) {
			Some(Value::String(id)) if !id.is_empty() => return Some(id.clone()),
			Some(Value::Number(id)) => return Some(id.to_string()),
			_ => {},
		}
	}

	None
}

fn item_unit_price(entry: &Value) -> Option<f64> {
	for key in ["sales_price", "calculated_price", "final_price", "price"] {
		match entry.get(key) {
			Some(Value::Number(price)) => return price.as_f64(),
			Some(Value::String(price)) =>
				if let Ok(parsed) = price.parse::<f64>() {
					return Some(parsed);
				},
			_ => {},
		}
	}

	None
}
