use axum::extract::State;

use crate::common::time::format_civil;
use crate::common::AppState;
use crate::error::AppResult;
use crate::frame::Reading;
use crate::ingest::queries;

/// Plain-text status page
///
/// Shows when the last reading was taken, in civil time, and the reading itself.
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Collector status", body = String, content_type = "text/plain"),
    ),
    tag = "status"
)]
pub async fn index(State(state): State<AppState>) -> AppResult<String> {
    let zone = state.config.civil_timezone;
    let mut page = format!("redenv-collector v{}\n\n", env!("CARGO_PKG_VERSION"));

    match queries::latest_reading(&state.db).await? {
        Some(row) => {
            let reading = Reading::try_from(&row)?;
            page.push_str(&format!(
                "last reading at: {}\nfrom {}:\n{}",
                format_civil(reading.recorded_at, zone),
                row.device,
                reading.display(zone),
            ));
        }
        None => page.push_str("no readings stored yet\n"),
    }

    Ok(page)
}
