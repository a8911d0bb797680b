//! Employee salary lookup against a SQLite `employee(id, name, salary)` table.
//!
//! The database is opened read-only on first use, so a registry can be built
//! (and listed) without the file being present.

use async_trait::async_trait;
use cognitor_core::value::number_value;
use cognitor_core::{
    BoundArguments, Capability, CapabilityError, CapabilityOutput, ParamSchema, ParamType,
};
use serde_json::{json, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

/// Why a salary lookup could not be answered.
#[derive(Debug, thiserror::Error)]
pub enum SalaryError {
    #[error("salary database {path} unavailable: {source}")]
    Unavailable { path: String, source: sqlx::Error },

    #[error("salary query failed: {0}")]
    Query(#[source] sqlx::Error),

    #[error("salary column unreadable: {0}")]
    Column(#[source] sqlx::Error),
}

pub struct SalaryDb {
    path: PathBuf,
    pool: OnceCell<SqlitePool>,
}

impl SalaryDb {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pool: OnceCell::new(),
        }
    }

    async fn pool(&self) -> Result<&SqlitePool, SalaryError> {
        self.pool
            .get_or_try_init(|| async {
                let options = SqliteConnectOptions::new()
                    .filename(&self.path)
                    .read_only(true);
                SqlitePoolOptions::new()
                    .max_connections(2)
                    .connect_with(options)
                    .await
                    .map_err(|source| SalaryError::Unavailable {
                        path: self.path.display().to_string(),
                        source,
                    })
            })
            .await
    }

    /// `Some(salary)` for a matching row, `None` when no employee matches.
    async fn salary_where(&self, column: Column, key: Value) -> Result<Option<f64>, SalaryError> {
        let pool = self.pool().await?;
        let sql = match column {
            Column::Id => "SELECT CAST(salary AS REAL) FROM employee WHERE id = ?1",
            Column::Name => "SELECT CAST(salary AS REAL) FROM employee WHERE name = ?1",
        };
        let query = sqlx::query(sql);
        let query = match key {
            Value::Number(n) => query.bind(n.as_i64().unwrap_or_default()),
            other => query.bind(other.as_str().unwrap_or_default().to_string()),
        };
        let row = query
            .fetch_optional(pool)
            .await
            .map_err(SalaryError::Query)?;
        match row {
            Some(row) => row
                .try_get::<Option<f64>, _>(0)
                .map_err(SalaryError::Column),
            None => Ok(None),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Column {
    Id,
    Name,
}

pub struct SalaryLookup {
    name: &'static str,
    description: &'static str,
    column: Column,
    schema: ParamSchema,
    db: Arc<SalaryDb>,
}

impl SalaryLookup {
    pub fn by_id(db: Arc<SalaryDb>) -> Self {
        Self {
            name: "salary_by_id",
            description: "Salary of the employee with the given id; returns {salary, found}",
            column: Column::Id,
            schema: ParamSchema::new().param("emp_id", ParamType::Integer),
            db,
        }
    }

    pub fn by_name(db: Arc<SalaryDb>) -> Self {
        Self {
            name: "salary_by_name",
            description: "Salary of the employee with the given name; returns {salary, found}",
            column: Column::Name,
            schema: ParamSchema::new().param("emp_name", ParamType::String),
            db,
        }
    }
}

#[async_trait]
impl Capability for SalaryLookup {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    fn schema(&self) -> &ParamSchema {
        &self.schema
    }

    async fn execute(&self, args: BoundArguments) -> Result<CapabilityOutput, CapabilityError> {
        let key = match self.column {
            Column::Id => Value::from(args.i64("emp_id")?),
            Column::Name => Value::String(args.str("emp_name")?),
        };
        debug!(capability = self.name, %key, "Looking up salary");
        let salary = self
            .db
            .salary_where(self.column, key)
            .await
            .map_err(|e| CapabilityError::failed(self.name, e.to_string()))?;

        let data = match salary {
            Some(s) => json!({ "salary": number_value(s), "found": true }),
            None => json!({ "salary": null, "found": false }),
        };
        Ok(CapabilityOutput::value(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cognitor_core::bind;

    async fn seeded_db(dir: &tempfile::TempDir) -> Arc<SalaryDb> {
        let path = dir.path().join("employee_salary.db");
        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Delete);
        let pool = SqlitePoolOptions::new().connect_with(options).await.unwrap();
        sqlx::query("CREATE TABLE employee (id INTEGER PRIMARY KEY, name TEXT NOT NULL, salary INTEGER)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO employee (id, name, salary) VALUES (1, 'Alice', 50000), (2, 'Bob', 42000)")
            .execute(&pool)
            .await
            .unwrap();
        pool.close().await;
        Arc::new(SalaryDb::new(path))
    }

    async fn run(cap: &SalaryLookup, raw: Value) -> Result<CapabilityOutput, CapabilityError> {
        cap.execute(bind(cap.name(), cap.schema(), &raw)?).await
    }

    #[tokio::test]
    async fn lookup_by_id_and_name() {
        let dir = tempfile::tempdir().unwrap();
        let db = seeded_db(&dir).await;

        let by_id = SalaryLookup::by_id(db.clone());
        let out = run(&by_id, json!({"emp_id": "1"})).await.unwrap();
        assert_eq!(out.data, Some(json!({"salary": 50000, "found": true})));

        let by_name = SalaryLookup::by_name(db);
        let out = run(&by_name, json!(["Bob"])).await.unwrap();
        assert_eq!(out.data, Some(json!({"salary": 42000, "found": true})));
    }

    #[tokio::test]
    async fn missing_employee_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let by_name = SalaryLookup::by_name(seeded_db(&dir).await);
        let out = run(&by_name, json!(["Mallory"])).await.unwrap();
        assert!(out.success);
        assert_eq!(out.data, Some(json!({"salary": null, "found": false})));
    }

    #[tokio::test]
    async fn missing_database_is_execution_failure() {
        let dir = tempfile::tempdir().unwrap();
        let by_id = SalaryLookup::by_id(Arc::new(SalaryDb::new(dir.path().join("absent.db"))));
        let err = run(&by_id, json!([1])).await.unwrap_err();
        assert!(matches!(err, CapabilityError::ExecutionFailed { .. }));
        assert!(err.to_string().contains("salary database"));
    }

    #[tokio::test]
    async fn missing_table_is_a_query_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.db");
        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Delete);
        SqlitePoolOptions::new().connect_with(options).await.unwrap().close().await;

        let db = SalaryDb::new(path);
        let err = db.salary_where(Column::Id, json!(1)).await.unwrap_err();
        assert!(matches!(err, SalaryError::Query(_)));
    }
}
