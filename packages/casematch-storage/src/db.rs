use casematch_domain::{NormalizedCriteria, StageSpec};
use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{Result, models::AdmissionHit, schema, stage_sql};

/// Connection pool to the analytical store. `pool_max_conns` doubles as the
/// bound on concurrent outstanding stage queries across all in-flight
/// searches.
pub struct Db {
	pub pool: PgPool,
}
impl Db {
	pub async fn connect(cfg: &casematch_config::Postgres) -> Result<Self> {
		let pool =
			PgPoolOptions::new().max_connections(cfg.pool_max_conns).connect(&cfg.dsn).await?;

		Ok(Self { pool })
	}

	pub async fn ensure_schema(&self) -> Result<()> {
		let sql = schema::render_schema();
		let lock_id: i64 = 23_170_141;
		// Advisory locks are held per connection. Use a single transaction so the lock is scoped to
		// one connection and automatically released when the transaction ends.
		let mut tx = self.pool.begin().await?;

		sqlx::query("SELECT pg_advisory_xact_lock($1)").bind(lock_id).execute(&mut *tx).await?;

		for statement in sql.split(';') {
			let trimmed = statement.trim();

			if trimmed.is_empty() {
				continue;
			}

			sqlx::query(trimmed).execute(&mut *tx).await?;
		}

		tx.commit().await?;

		Ok(())
	}

	/// Runs one cascade stage and returns its candidate rows, already ordered
	/// by the stage's composite sort.
	pub async fn fetch_stage(
		&self,
		norm: &NormalizedCriteria,
		stage: &StageSpec,
		exclude: &[i64],
		limit: i64,
		overbroad_penalty: f64,
	) -> Result<Vec<AdmissionHit>> {
		let mut builder = stage_sql::build_stage_query(norm, stage, exclude, limit, overbroad_penalty);
		let hits = builder.build_query_as::<AdmissionHit>().fetch_all(&self.pool).await?;

		Ok(hits)
	}
}
