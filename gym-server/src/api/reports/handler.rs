//! Report export handler

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use shared::models::{ExportFormat, ExportType};
use shared::{ApiResponse, AppError, AppResult};

use crate::auth::Grant;
use crate::core::ServerState;
use crate::db::repository::attendance::{self, AttendanceFilter};
use crate::db::repository::class::{self, ClassFilter};
use crate::db::repository::token_transaction::{self, TransactionFilter};
use crate::db::repository::{gym, member};
use crate::utils::DateRangeParams;
use crate::utils::extract::{Path, Query};
use crate::utils::csv::{CsvRecord, encode};
use crate::utils::types::parse_status;

#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    /// Members only: name, email or member code
    pub search: Option<String>,
    /// active | inactive | all
    pub status: Option<String>,
}

fn render<T: CsvRecord + Serialize>(
    rows: Vec<T>,
    export_type: ExportType,
    format: ExportFormat,
) -> Response {
    match format {
        ExportFormat::Json => ApiResponse::success(rows).into_response(),
        ExportFormat::Csv => {
            let filename = format!(
                "{}-{}.csv",
                export_type.as_str(),
                chrono::Utc::now().format("%Y-%m-%d")
            );
            (
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{filename}\""),
                    ),
                ],
                encode(&rows),
            )
                .into_response()
        }
    }
}

/// Export one dataset as JSON or CSV
pub async fn export(
    State(state): State<ServerState>,
    grant: Grant,
    Path((export_type, format)): Path<(String, String)>,
    Query(query): Query<ExportQuery>,
    Query(range): Query<DateRangeParams>,
) -> AppResult<Response> {
    let export_type: ExportType = export_type.parse().map_err(AppError::validation)?;
    let format: ExportFormat = format.parse().map_err(AppError::validation)?;
    let is_active = parse_status(query.status.as_deref())?;
    let (from, to) = range.bounds()?;

    let db = &state.db;
    let pool = &db.pool;
    let response = match export_type {
        ExportType::Members => {
            let rows = db
                .query(member::list_all(pool, query.search.as_deref(), is_active))
                .await?;
            log_export(&grant, export_type, format, rows.len());
            render(rows, export_type, format)
        }
        ExportType::Gyms => {
            let rows = db.query(gym::list_all(pool, is_active)).await?;
            log_export(&grant, export_type, format, rows.len());
            render(rows, export_type, format)
        }
        ExportType::Classes => {
            let filter = ClassFilter {
                is_active,
                ..Default::default()
            };
            let rows = db.query(class::list_all(pool, filter)).await?;
            log_export(&grant, export_type, format, rows.len());
            render(rows, export_type, format)
        }
        ExportType::Attendance => {
            let filter = AttendanceFilter {
                from,
                to,
                ..Default::default()
            };
            let rows = db.query(attendance::list_all(pool, filter)).await?;
            log_export(&grant, export_type, format, rows.len());
            render(rows, export_type, format)
        }
        ExportType::Transactions => {
            let filter = TransactionFilter {
                from,
                to,
                ..Default::default()
            };
            let rows = db.query(token_transaction::list_all(pool, filter)).await?;
            log_export(&grant, export_type, format, rows.len());
            render(rows, export_type, format)
        }
    };
    Ok(response)
}

fn log_export(grant: &Grant, export_type: ExportType, format: ExportFormat, rows: usize) {
    tracing::info!(
        export_type = export_type.as_str(),
        format = ?format,
        rows,
        by = grant.user.id,
        "Report exported"
    );
}
