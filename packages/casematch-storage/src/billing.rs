use std::collections::BTreeSet;

use crate::{
	Result,
	db::Db,
	models::{BillingItemRow, BillingSummary},
};

impl Db {
	/// Billing rollup for one admission. `None` when the admission has no
	/// billing rows at all, so callers can distinguish "no billing data" from
	/// an empty-but-priced stay.
	pub async fn billing_for_admission(&self, admission_id: i64) -> Result<Option<BillingSummary>> {
		let items: Vec<BillingItemRow> = sqlx::query_as(
			"SELECT admission_id, billing_item_id, item_type, item_name, quantity, \
			 item_net_amount FROM billing_items WHERE admission_id = $1 ORDER BY billing_item_id",
		)
		.bind(admission_id)
		.fetch_all(&self.pool)
		.await?;

		if items.is_empty() {
			return Ok(None);
		}

		Ok(Some(summarize(admission_id, items)))
	}
}

fn summarize(admission_id: i64, items: Vec<BillingItemRow>) -> BillingSummary {
	let total_amount =
		(items.iter().map(|item| item.item_net_amount).sum::<f64>() * 100.).round() / 100.;
	let item_types = items
		.iter()
		.map(|item| item.item_type.clone())
		.filter(|kind| !kind.is_empty())
		.collect::<BTreeSet<_>>()
		.into_iter()
		.collect();

	BillingSummary { admission_id, total_items: items.len(), total_amount, item_types, items }
}

#[cfg(test)]
mod tests {
	use super::*;

	fn item(id: &str, kind: &str, amount: f64) -> BillingItemRow {
		BillingItemRow {
			admission_id: 1,
			billing_item_id: id.to_string(),
			item_type: kind.to_string(),
			item_name: String::new(),
			quantity: 1,
			item_net_amount: amount,
		}
	}

	#[test]
	fn summary_rounds_and_dedupes_item_types() {
		let summary = summarize(
			1,
			vec![item("a", "Drug", 10.12), item("b", "Drug", 2.5), item("c", "Lab", 0.1)],
		);

		assert_eq!(summary.total_items, 3);
		assert_eq!(summary.total_amount, 12.72);
		assert_eq!(summary.item_types, vec!["Drug".to_string(), "Lab".to_string()]);
	}
}
