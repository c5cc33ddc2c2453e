//! CSV exports. Every field is quoted; cells that a spreadsheet would read as
//! a formula get a leading apostrophe.

use axum::{
    http::header,
    response::{IntoResponse, Response},
};
use csv::{QuoteStyle, WriterBuilder};

use crate::error::{AppError, AppResult};

fn neutralize(cell: &str) -> String {
    match cell.chars().next() {
        Some('=' | '+' | '-' | '@' | '\t' | '\r') => format!("'{cell}"),
        _ => cell.to_string(),
    }
}

pub fn write_csv(headers: &[&str], rows: impl IntoIterator<Item = Vec<String>>) -> AppResult<String> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_writer(Vec::new());

    writer
        .write_record(headers)
        .map_err(|e| AppError::Internal(e.into()))?;
    for row in rows {
        writer
            .write_record(row.iter().map(|cell| neutralize(cell)))
            .map_err(|e| AppError::Internal(e.into()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;
    String::from_utf8(bytes).map_err(|e| AppError::Internal(e.into()))
}

/// Download response for a generated CSV document.
pub fn attachment(file_name: &str, body: String) -> Response {
    let disposition = format!("attachment; filename=\"{file_name}\"");
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response()
}

/// Minor units to a `12.34` string.
pub fn money(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_and_escapes_fields() {
        let csv = write_csv(
            &["name", "note"],
            vec![vec!["Acme, Inc".to_string(), "said \"hi\"".to_string()]],
        )
        .unwrap();
        assert_eq!(csv, "\"name\",\"note\"\n\"Acme, Inc\",\"said \"\"hi\"\"\"\n");
    }

    #[test]
    fn formula_cells_are_neutralized() {
        let csv = write_csv(&["x"], vec![vec!["=SUM(A1)".to_string()]]).unwrap();
        assert!(csv.contains("\"'=SUM(A1)\""));
    }

    #[test]
    fn attachment_sets_download_headers() {
        let resp = attachment("orders.csv", "\"a\"\n".to_string());
        assert_eq!(
            resp.headers()[header::CONTENT_TYPE],
            "text/csv; charset=utf-8"
        );
        assert_eq!(
            resp.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"orders.csv\""
        );
    }

    #[test]
    fn money_formats_cents() {
        assert_eq!(money(33_000), "330.00");
        assert_eq!(money(5), "0.05");
        assert_eq!(money(-150), "-1.50");
    }
}
