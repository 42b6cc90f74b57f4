use std::{collections::HashMap, sync::Arc};

use axum::{
	body::Body,
	http::{Request, StatusCode, header},
};
use casematch_api::{routes, state::AppState};
use casematch_config::{Config, Postgres, Search, Service, Storage};
use casematch_domain::{NormalizedCriteria, StageSpec};
use casematch_providers::pricing::{ItemPrice, PricingContext, PricingItem};
use casematch_service::{
	BillingLookup, BoxFuture, CasematchService, Collaborators, PricingEngine, StageExecutor,
};
use casematch_storage::models::{AdmissionHit, BillingItemRow, BillingSummary};
use time::macros::{date, datetime};
use tower::ServiceExt;

struct MockStore {
	rows_by_stage: HashMap<u8, Vec<i64>>,
	billing: HashMap<i64, BillingSummary>,
}

struct NoPricing;

fn hit(id: i64) -> AdmissionHit {
	AdmissionHit {
		admission_id: id,
		patient_id: id,
		facility_code: "RSUA".into(),
		facility_id: 3,
		event_category: "Inpatient".into(),
		event_category_id: 1,
		event_date: datetime!(2024-03-10 08:30:00),
		end_date: None,
		birth_date: date!(1980-05-20),
		sex: "F".into(),
		patient_category: "General".into(),
		patient_category_id: 1,
		clinician: "dr. Sari".into(),
		clinician_user_id: 77,
		clinician_specialty: "Internist".into(),
		region: "East".into(),
		archetype: "B".into(),
		diagnosis_codes: "A09".into(),
		procedure_codes: String::new(),
		invoice_class: "Class 1".into(),
		invoice_class_id: 5,
		payer_name: "ACME HEALTH".into(),
		payer_id: 9,
		payer_category: "Insurance".into(),
		invoice_net_amount: 500.,
		age: 43,
		duration_days: None,
		secondary_staff: String::new(),
		secondary_staff_category: String::new(),
		diagnosis_score: 1.,
		procedure_score: 0.,
		age_diff: 0,
		date_diff: 0,
		duration_diff: 0,
	}
}

impl StageExecutor for MockStore {
	fn run_stage<'a>(
		&'a self,
		_norm: &'a NormalizedCriteria,
		stage: &'a StageSpec,
		exclude: &'a [i64],
		_limit: i64,
		_overbroad_penalty: f64,
	) -> BoxFuture<'a, color_eyre::Result<Vec<AdmissionHit>>> {
		let rows = self.rows_by_stage.get(&stage.ordinal).cloned().unwrap_or_default();
		let exclude = exclude.to_vec();

		Box::pin(async move {
			Ok(rows.into_iter().filter(|id| !exclude.contains(id)).map(hit).collect())
		})
	}
}

impl BillingLookup for MockStore {
	fn billing_for<'a>(
		&'a self,
		admission_id: i64,
	) -> BoxFuture<'a, color_eyre::Result<Option<BillingSummary>>> {
		Box::pin(async move { Ok(self.billing.get(&admission_id).cloned()) })
	}
}

impl PricingEngine for NoPricing {
	fn recalculate<'a>(
		&'a self,
		_cfg: &'a casematch_config::PricingProviderConfig,
		_ctx: &'a PricingContext,
		_items: &'a [PricingItem],
	) -> BoxFuture<'a, color_eyre::Result<Vec<ItemPrice>>> {
		Box::pin(async move { Ok(Vec::new()) })
	}
}

fn config() -> Config {
	Config {
		service: Service { http_bind: "127.0.0.1:0".into(), log_level: "info".into() },
		storage: Storage {
			postgres: Postgres { dsn: "postgres://localhost/casematch".into(), pool_max_conns: 4 },
		},
		search: Search {
			default_max_results: 3,
			max_results_cap: 20,
			stage_row_limit: 50,
			overbroad_penalty: -0.1,
			stage_timeout_ms: None,
		},
		providers: None,
	}
}

fn app(rows_by_stage: HashMap<u8, Vec<i64>>, billing: HashMap<i64, BillingSummary>) -> axum::Router {
	let store = Arc::new(MockStore { rows_by_stage, billing });
	let service = CasematchService::with_collaborators(config(), Collaborators {
		executor: store.clone(),
		billing: store,
		pricing: Arc::new(NoPricing),
	});

	routes::router(AppState::with_service(service))
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
	Request::builder()
		.method("POST")
		.uri(uri)
		.header(header::CONTENT_TYPE, "application/json")
		.body(Body::from(body.to_string()))
		.unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
	let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();

	serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_is_ok() {
	let app = app(HashMap::new(), HashMap::new());
	let response =
		app.oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap()).await.unwrap();

	assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn empty_criteria_is_a_bad_request() {
	let app = app(HashMap::new(), HashMap::new());
	let response =
		app.oneshot(post_json("/v1/admissions/search", serde_json::json!({}))).await.unwrap();

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);

	let body = body_json(response).await;

	assert_eq!(body["error_code"], "invalid_request");
}

#[tokio::test]
async fn search_returns_stage_tagged_matches() {
	let app = app(HashMap::from([(3, vec![11, 12])]), HashMap::new());
	let response = app
		.oneshot(post_json(
			"/v1/admissions/search",
			serde_json::json!({ "diagnosis_codes": ["A09"], "max_results": 2 }),
		))
		.await
		.unwrap();

	assert_eq!(response.status(), StatusCode::OK);

	let body = body_json(response).await;

	assert_eq!(body["total"], 2);
	assert_eq!(body["matches"][0]["admission_id"], 11);
	assert_eq!(body["matches"][0]["stage"], 3);
	assert_eq!(body["matches"][0]["event_date"], "2024-03-10 08:30:00");
}

#[tokio::test]
async fn search_billing_marks_matches_without_billing_rows() {
	let billing = HashMap::from([(11, BillingSummary {
		admission_id: 11,
		total_items: 1,
		total_amount: 250.,
		item_types: vec!["Drug".into()],
		items: vec![BillingItemRow {
			admission_id: 11,
			billing_item_id: "OBAT-1".into(),
			item_type: "Drug".into(),
			item_name: "Item".into(),
			quantity: 1,
			item_net_amount: 250.,
		}],
	})]);
	let app = app(HashMap::from([(1, vec![11, 12])]), billing);
	let response = app
		.oneshot(post_json(
			"/v1/admissions/search_billing",
			serde_json::json!({ "diagnosis_codes": ["A09"], "max_results": 2 }),
		))
		.await
		.unwrap();

	assert_eq!(response.status(), StatusCode::OK);

	let body = body_json(response).await;

	assert_eq!(body["matches"][0]["has_billing"], true);
	assert_eq!(body["matches"][0]["billing"]["total_amount"], 250.0);
	assert_eq!(body["matches"][1]["has_billing"], false);
}
