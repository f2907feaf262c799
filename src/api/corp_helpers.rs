use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    routing::get,
    Router,
};

use crate::api::middleware::auth::{Empty, Guarded, Requester};
use crate::api::middleware::session::AppState;
use crate::error::Result;
use crate::models::tax_history::{CorpTaxHistory, TaxRateChange};
use crate::services::tax_history::{self, SyncOutcome};

async fn get_tax_history(
    State(state): State<AppState>,
    requester: Requester,
    Path(corp_id): Path<i64>,
) -> Result<Guarded<Vec<CorpTaxHistory>>> {
    if let Some(denied) = Guarded::for_superuser(&requester, Empty::List) {
        return Ok(denied);
    }

    Ok(Guarded::Allowed(
        CorpTaxHistory::get_corp_tax_list(&state.pool, corp_id).await?,
    ))
}

async fn find_tax_history(
    State(state): State<AppState>,
    requester: Requester,
    Path(corp_id): Path<i64>,
) -> Result<Guarded<Vec<TaxRateChange>>> {
    if let Some(denied) = Guarded::for_superuser(&requester, Empty::List) {
        return Ok(denied);
    }

    Ok(Guarded::Allowed(
        tax_history::find_corp_tax_changes(&state.pool, corp_id).await?,
    ))
}

/// Pulls the current rate from ESI and stores any new history rows
async fn sync_tax_history(
    State(state): State<AppState>,
    requester: Requester,
    Path(corp_id): Path<i64>,
) -> Result<Guarded<Vec<CorpTaxHistory>>> {
    if let Some(denied) = Guarded::for_superuser(&requester, Empty::List) {
        return Ok(denied);
    }

    tracing::info!(corporation_id = corp_id, "Manual tax history sync");

    let added = tax_history::sync_corp_tax_changes(&state.pool, &state.esi, corp_id).await?;

    Ok(Guarded::Allowed(added))
}

async fn sync_all_tax_histories(
    State(state): State<AppState>,
    requester: Requester,
) -> Result<Guarded<BTreeMap<i64, SyncOutcome>>> {
    if let Some(denied) = Guarded::for_superuser(&requester, Empty::Map) {
        return Ok(denied);
    }

    tracing::info!("Manual tax history sync for all corporations");

    Ok(Guarded::Allowed(
        tax_history::sync_all_corps(&state.pool, &state.esi).await?,
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/corp/:corp_id/tax/history", get(get_tax_history))
        .route("/corp/:corp_id/tax/history/find", get(find_tax_history))
        .route("/corp/:corp_id/tax/history/sync", get(sync_tax_history))
        .route("/corp/tax/history/sync/all", get(sync_all_tax_histories))
}
