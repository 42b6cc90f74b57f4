pub mod analysis;
pub mod billing;
pub mod cascade;
pub mod format;

use std::{future::Future, pin::Pin, sync::Arc};

pub use analysis::{CriteriaAnalysis, CriterionComparison};
pub use billing::{
	BillingAnalysis, BillingAnalysisRequest, BillingItemView, BillingView, EstimatedBilling,
	MatchWithBilling, RepricedItem, SearchWithBillingResponse,
};
use casematch_config::Config;
use casematch_domain::{NormalizedCriteria, StageSpec};
use casematch_providers::pricing::{self, ItemPrice, PricingContext, PricingItem};
use casematch_storage::{
	db::Db,
	models::{AdmissionHit, BillingSummary},
};
pub use cascade::{SearchOutcome, SearchRequest};
pub use format::MatchResult;

pub type ServiceResult<T> = Result<T, ServiceError>;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Runs one relaxation stage against the backing store.
pub trait StageExecutor
where
	Self: Send + Sync,
{
	fn run_stage<'a>(
		&'a self,
		norm: &'a NormalizedCriteria,
		stage: &'a StageSpec,
		exclude: &'a [i64],
		limit: i64,
		overbroad_penalty: f64,
	) -> BoxFuture<'a, color_eyre::Result<Vec<AdmissionHit>>>;
}

/// Fetches the billing rollup for one admission.
pub trait BillingLookup
where
	Self: Send + Sync,
{
	fn billing_for<'a>(
		&'a self,
		admission_id: i64,
	) -> BoxFuture<'a, color_eyre::Result<Option<BillingSummary>>>;
}

/// Recalculates current tariffs for a set of billing items.
pub trait PricingEngine
where
	Self: Send + Sync,
{
	fn recalculate<'a>(
		&'a self,
		cfg: &'a casematch_config::PricingProviderConfig,
		ctx: &'a PricingContext,
		items: &'a [PricingItem],
	) -> BoxFuture<'a, color_eyre::Result<Vec<ItemPrice>>>;
}

#[derive(Debug)]
pub enum ServiceError {
	InvalidRequest { message: String },
	Storage { message: String },
	Collaborator { message: String },
}

#[derive(Clone)]
pub struct Collaborators {
	pub executor: Arc<dyn StageExecutor>,
	pub billing: Arc<dyn BillingLookup>,
	pub pricing: Arc<dyn PricingEngine>,
}

pub struct CasematchService {
	pub cfg: Config,
	pub collaborators: Collaborators,
}

struct DbCollaborator {
	db: Arc<Db>,
}

struct DefaultPricing;

impl std::fmt::Display for ServiceError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::InvalidRequest { message } => write!(f, "Invalid request: {message}"),
			Self::Storage { message } => write!(f, "Storage error: {message}"),
			Self::Collaborator { message } => write!(f, "Collaborator error: {message}"),
		}
	}
}

impl std::error::Error for ServiceError {}

impl From<casematch_storage::Error> for ServiceError {
	fn from(err: casematch_storage::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}

impl From<color_eyre::Report> for ServiceError {
	fn from(err: color_eyre::Report) -> Self {
		Self::Collaborator { message: err.to_string() }
	}
}

impl StageExecutor for DbCollaborator {
	fn run_stage<'a>(
		&'a self,
		norm: &'a NormalizedCriteria,
		stage: &'a StageSpec,
		exclude: &'a [i64],
		limit: i64,
		overbroad_penalty: f64,
	) -> BoxFuture<'a, color_eyre::Result<Vec<AdmissionHit>>> {
		Box::pin(async move {
			Ok(self.db.fetch_stage(norm, stage, exclude, limit, overbroad_penalty).await?)
		})
	}
}

impl BillingLookup for DbCollaborator {
	fn billing_for<'a>(
		&'a self,
		admission_id: i64,
	) -> BoxFuture<'a, color_eyre::Result<Option<BillingSummary>>> {
		Box::pin(async move { Ok(self.db.billing_for_admission(admission_id).await?) })
	}
}

impl PricingEngine for DefaultPricing {
	fn recalculate<'a>(
		&'a self,
		cfg: &'a casematch_config::PricingProviderConfig,
		ctx: &'a PricingContext,
		items: &'a [PricingItem],
	) -> BoxFuture<'a, color_eyre::Result<Vec<ItemPrice>>> {
		Box::pin(pricing::recalculate(cfg, ctx, items))
	}
}

impl Collaborators {
	pub fn for_db(db: Arc<Db>) -> Self {
		let store = Arc::new(DbCollaborator { db });

		Self { executor: store.clone(), billing: store, pricing: Arc::new(DefaultPricing) }
	}
}

impl CasematchService {
	pub fn new(cfg: Config, db: Db) -> Self {
		Self { cfg, collaborators: Collaborators::for_db(Arc::new(db)) }
	}

	pub fn with_collaborators(cfg: Config, collaborators: Collaborators) -> Self {
		Self { cfg, collaborators }
	}
}
