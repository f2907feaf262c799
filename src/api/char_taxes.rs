use std::collections::BTreeMap;

use axum::{
    extract::{Query, State},
    routing::get,
    Router,
};
use chrono::Utc;
use sqlx::PgPool;

use crate::api::middleware::auth::{Empty, Guarded, Requester};
use crate::api::middleware::session::AppState;
use crate::api::params::WindowParams;
use crate::error::{AppError, Result};
use crate::models::aggregate::{
    group_by_corporation, CharacterAggregate, CorporationAggregate, CorporationGroup,
};
use crate::models::wallet::CharacterWalletEvent;
use crate::models::CharacterPayoutTaxConfiguration;

async fn load_configuration(pool: &PgPool, conf_id: i64) -> Result<CharacterPayoutTaxConfiguration> {
    CharacterPayoutTaxConfiguration::find_by_id(pool, conf_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "Character payout tax configuration {} not found",
                conf_id
            ))
        })
}

/// Journal entries taxed by the configuration
async fn get_char_tax_data(
    State(state): State<AppState>,
    requester: Requester,
    Query(params): Query<WindowParams>,
) -> Result<Guarded<Vec<CharacterWalletEvent>>> {
    if let Some(denied) = Guarded::for_superuser(&requester, Empty::List) {
        return Ok(denied);
    }

    let start = params.start_date(Utc::now())?;
    let conf = load_configuration(&state.pool, params.conf_id).await?;
    let events = conf.get_payment_data(&state.pool, start).await?;

    tracing::debug!(conf_id = conf.id, rows = events.len(), "Character tax list");

    Ok(Guarded::Allowed(events))
}

async fn get_char_tax_aggregates(
    State(state): State<AppState>,
    requester: Requester,
    Query(params): Query<WindowParams>,
) -> Result<Guarded<Vec<CharacterAggregate>>> {
    if let Some(denied) = Guarded::for_superuser(&requester, Empty::List) {
        return Ok(denied);
    }

    let start = params.start_date(Utc::now())?;
    let conf = load_configuration(&state.pool, params.conf_id).await?;

    Ok(Guarded::Allowed(
        conf.get_character_aggregates(&state.pool, start).await?,
    ))
}

async fn get_char_tax_aggregates_corp(
    State(state): State<AppState>,
    requester: Requester,
    Query(params): Query<WindowParams>,
) -> Result<Guarded<Vec<CorporationAggregate>>> {
    if let Some(denied) = Guarded::for_superuser(&requester, Empty::List) {
        return Ok(denied);
    }

    let start = params.start_date(Utc::now())?;
    let conf = load_configuration(&state.pool, params.conf_id).await?;

    Ok(Guarded::Allowed(
        conf.get_character_aggregates_corp_level(&state.pool, start)
            .await?,
    ))
}

/// Character totals regrouped by corporation name
async fn get_char_tax_aggregate_groups(
    State(state): State<AppState>,
    requester: Requester,
    Query(params): Query<WindowParams>,
) -> Result<Guarded<BTreeMap<String, CorporationGroup>>> {
    if let Some(denied) = Guarded::for_superuser(&requester, Empty::List) {
        return Ok(denied);
    }

    let start = params.start_date(Utc::now())?;
    let conf = load_configuration(&state.pool, params.conf_id).await?;
    let rows = conf.get_aggregates(&state.pool, start).await?;

    Ok(Guarded::Allowed(group_by_corporation(&rows)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/char/tax/list", get(get_char_tax_data))
        .route("/char/tax/aggregates", get(get_char_tax_aggregates))
        .route("/char/tax/aggregates/corp", get(get_char_tax_aggregates_corp))
        .route("/char/tax/aggregates/groups", get(get_char_tax_aggregate_groups))
}
