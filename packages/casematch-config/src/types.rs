use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub search: Search,
	pub providers: Option<Providers>,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Search {
	#[serde(default = "default_max_results")]
	pub default_max_results: u32,
	#[serde(default = "default_max_results_cap")]
	pub max_results_cap: u32,
	/// Candidate rows fetched per stage before the driver dedupes and caps.
	#[serde(default = "default_stage_row_limit")]
	pub stage_row_limit: u32,
	/// Score penalty applied when a stored record carries more delimited codes
	/// than the request asked for. Tunable; the historical value is -0.1.
	#[serde(default = "default_overbroad_penalty")]
	pub overbroad_penalty: f64,
	/// Optional per-stage deadline. Unset means no deadline, matching the
	/// baseline cascade.
	pub stage_timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub pricing: Option<PricingProviderConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PricingProviderConfig {
	pub api_base: String,
	pub path: String,
	pub timeout_ms: u64,
}

fn default_max_results() -> u32 {
	3
}

fn default_max_results_cap() -> u32 {
	20
}

fn default_stage_row_limit() -> u32 {
	50
}

fn default_overbroad_penalty() -> f64 {
	-0.1
}
