mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, Postgres, PricingProviderConfig, Providers, Search, Service, Storage};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.search.default_max_results == 0 {
		return Err(Error::Validation {
			message: "search.default_max_results must be greater than zero.".to_string(),
		});
	}
	if cfg.search.max_results_cap < cfg.search.default_max_results {
		return Err(Error::Validation {
			message: "search.max_results_cap must be at least search.default_max_results."
				.to_string(),
		});
	}
	if cfg.search.stage_row_limit == 0 {
		return Err(Error::Validation {
			message: "search.stage_row_limit must be greater than zero.".to_string(),
		});
	}
	if !cfg.search.overbroad_penalty.is_finite() {
		return Err(Error::Validation {
			message: "search.overbroad_penalty must be a finite number.".to_string(),
		});
	}
	if cfg.search.overbroad_penalty > 0.0 {
		return Err(Error::Validation {
			message: "search.overbroad_penalty must be zero or less.".to_string(),
		});
	}

	if let Some(timeout_ms) = cfg.search.stage_timeout_ms
		&& timeout_ms == 0
	{
		return Err(Error::Validation {
			message: "search.stage_timeout_ms must be greater than zero when set.".to_string(),
		});
	}

	if let Some(pricing) = cfg.providers.as_ref().and_then(|providers| providers.pricing.as_ref()) {
		if pricing.api_base.trim().is_empty() {
			return Err(Error::Validation {
				message: "providers.pricing.api_base must be non-empty.".to_string(),
			});
		}
		if pricing.timeout_ms == 0 {
			return Err(Error::Validation {
				message: "providers.pricing.timeout_ms must be greater than zero.".to_string(),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if let Some(providers) = cfg.providers.as_mut()
		&& providers
			.pricing
			.as_ref()
			.map(|pricing| pricing.api_base.trim().is_empty())
			.unwrap_or(false)
	{
		providers.pricing = None;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn base_config() -> Config {
		Config {
			service: Service {
				http_bind: "127.0.0.1:8080".to_string(),
				log_level: "info".to_string(),
			},
			storage: Storage {
				postgres: Postgres {
					dsn: "postgres://localhost/casematch".to_string(),
					pool_max_conns: 4,
				},
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

	#[test]
	fn accepts_baseline_config() {
		assert!(validate(&base_config()).is_ok());
	}

	#[test]
	fn rejects_positive_penalty() {
		let mut cfg = base_config();

		cfg.search.overbroad_penalty = 0.5;

		assert!(validate(&cfg).is_err());
	}

	#[test]
	fn rejects_cap_below_default() {
		let mut cfg = base_config();

		cfg.search.max_results_cap = 2;

		assert!(validate(&cfg).is_err());
	}

	#[test]
	fn normalize_drops_blank_pricing() {
		let mut cfg = base_config();

		cfg.providers = Some(Providers {
			pricing: Some(PricingProviderConfig {
				api_base: "   ".to_string(),
				path: "/v2/recalculate".to_string(),
				timeout_ms: 1_000,
			}),
		});

		normalize(&mut cfg);

		assert!(cfg.providers.as_ref().unwrap().pricing.is_none());
	}
}
