use std::collections::BTreeMap;

use axum::{
    extract::{Query, State},
    routing::get,
    Router,
};
use chrono::Utc;

use crate::api::middleware::auth::{Empty, Guarded, Requester};
use crate::api::middleware::session::AppState;
use crate::api::params::{window_start, GlobalTaxParams};
use crate::error::{AppError, Result};
use crate::models::corp_tax::CorporationTaxSummary;
use crate::models::CorpTaxConfiguration;

/// Combined character, corporate and member taxes per corporation
async fn get_global_corp_taxes(
    State(state): State<AppState>,
    requester: Requester,
    Query(params): Query<GlobalTaxParams>,
) -> Result<Guarded<BTreeMap<i64, CorporationTaxSummary>>> {
    if let Some(denied) = Guarded::for_superuser(&requester, Empty::List) {
        return Ok(denied);
    }

    let start = window_start(Utc::now(), params.days)?;
    let conf = CorpTaxConfiguration::find_by_id(&state.pool, params.conf_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Tax configuration {} not found", params.conf_id))
        })?;

    let summary = conf
        .calculate_tax(&state.pool, start, params.alli_filter)
        .await?;

    tracing::debug!(
        conf_id = conf.id,
        alliance_filter = ?params.alli_filter,
        corporations = summary.len(),
        "Global corporation taxes calculated"
    );

    Ok(Guarded::Allowed(summary))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/global/corp/tax/aggregates", get(get_global_corp_taxes))
}
