use sea_orm::{ConnectionTrait, DbBackend, Statement};

use crate::{
    domain::numbering::format_number,
    error::{AppError, AppResult},
};

/// Reserve the next number for `(prefix, year)` with a single atomic upsert.
///
/// Call inside the transaction that inserts the numbered row: the counter row
/// stays locked until commit, and a rollback releases the number again.
pub async fn next_number<C: ConnectionTrait>(
    conn: &C,
    prefix: &str,
    year: i32,
) -> AppResult<String> {
    let stmt = Statement::from_sql_and_values(
        DbBackend::Postgres,
        r#"
        INSERT INTO number_sequences (prefix, year, last_value)
        VALUES ($1, $2, 1)
        ON CONFLICT (prefix, year)
        DO UPDATE SET last_value = number_sequences.last_value + 1
        RETURNING last_value
        "#,
        [prefix.into(), year.into()],
    );

    let row = conn
        .query_one(stmt)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("sequence upsert returned no row")))?;
    let seq: i64 = row.try_get("", "last_value")?;

    let number = format_number(prefix, year, seq);
    if number.trim().is_empty() {
        return Err(AppError::Internal(anyhow::anyhow!(
            "failed to generate a number for {prefix}"
        )));
    }
    tracing::debug!(%number, "reserved sequence number");
    Ok(number)
}
