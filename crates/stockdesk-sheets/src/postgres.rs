use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use sqlx::{PgPool, Row};
use stockdesk_core::{SheetName, SheetRecord, SheetStore, StoreError};
use tracing::{error, info};

/// Sheet store backed by two Postgres tables: one header row per sheet and
/// the data rows as JSON objects keyed by header, in append order.
#[derive(Clone)]
pub struct PgSheetStore {
    pool: PgPool,
}

impl PgSheetStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sheet_headers (
                sheet TEXT PRIMARY KEY,
                headers JSONB NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sheet_rows (
                id BIGSERIAL PRIMARY KEY,
                sheet TEXT NOT NULL,
                cells JSONB NOT NULL,
                appended_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS sheet_rows_sheet_idx ON sheet_rows (sheet, id)")
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;

        info!("sheet store schema ready");
        Ok(())
    }

    /// Writes the default header row for every sheet that has none yet.
    /// Existing header rows are left alone.
    pub async fn seed_default_headers(&self) -> Result<(), StoreError> {
        for sheet in SheetName::ALL {
            let inserted = sqlx::query(
                r#"
                INSERT INTO sheet_headers (sheet, headers)
                VALUES ($1, $2)
                ON CONFLICT (sheet) DO NOTHING
                "#,
            )
            .bind(sheet.title())
            .bind(Value::from(sheet.default_headers().to_vec()))
            .execute(&self.pool)
            .await
            .map_err(unavailable)?
            .rows_affected();

            if inserted > 0 {
                info!(%sheet, "seeded default header row");
            }
        }
        Ok(())
    }
}

#[async_trait]
impl SheetStore for PgSheetStore {
    async fn headers(&self, sheet: SheetName) -> Result<Vec<String>, StoreError> {
        let row = sqlx::query("SELECT headers FROM sheet_headers WHERE sheet = $1")
            .bind(sheet.title())
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?;

        let Some(row) = row else {
            return Ok(Vec::new());
        };
        let headers: Value = row.try_get("headers").map_err(unavailable)?;
        Ok(headers_from_json(&headers))
    }

    async fn records(&self, sheet: SheetName) -> Result<Vec<SheetRecord>, StoreError> {
        let rows = sqlx::query("SELECT cells FROM sheet_rows WHERE sheet = $1 ORDER BY id")
            .bind(sheet.title())
            .fetch_all(&self.pool)
            .await
            .map_err(unavailable)?;

        rows.iter()
            .enumerate()
            .map(|(index, row)| {
                let cells: Value = row.try_get("cells").map_err(unavailable)?;
                Ok(record_from_cells(index + 2, cells))
            })
            .collect()
    }

    async fn append_row(&self, sheet: SheetName, values: Vec<String>) -> Result<(), StoreError> {
        let headers = self.headers(sheet).await?;
        let cells = row_cells(sheet, headers, values)?;

        sqlx::query("INSERT INTO sheet_rows (sheet, cells, appended_at) VALUES ($1, $2, $3)")
            .bind(sheet.title())
            .bind(Value::Object(cells))
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(|err| {
                error!(%sheet, "failed to append row: {err}");
                unavailable(err)
            })?;

        Ok(())
    }
}

fn unavailable(err: sqlx::Error) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

fn headers_from_json(headers: &Value) -> Vec<String> {
    headers
        .as_array()
        .map(|values| {
            values
                .iter()
                .filter_map(|value| value.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// A stored row that is not a JSON object reads as a row of blank cells.
fn record_from_cells(row: usize, cells: Value) -> SheetRecord {
    match cells {
        Value::Object(map) => SheetRecord::new(row, map),
        _ => SheetRecord::new(row, Map::new()),
    }
}

/// Lays `values` out under `headers`. Missing trailing values are stored as
/// empty cells.
fn row_cells(
    sheet: SheetName,
    headers: Vec<String>,
    values: Vec<String>,
) -> Result<Map<String, Value>, StoreError> {
    if headers.is_empty() {
        return Err(StoreError::MissingHeaders(sheet));
    }
    if values.len() > headers.len() {
        return Err(StoreError::Rejected {
            sheet,
            reason: format!("{} values for {} columns", values.len(), headers.len()),
        });
    }

    Ok(headers
        .into_iter()
        .zip(values.into_iter().chain(std::iter::repeat(String::new())))
        .map(|(header, value)| (header, Value::String(value)))
        .collect())
}
