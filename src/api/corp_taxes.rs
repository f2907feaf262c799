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
use crate::api::params::{window_start, ConfParams, CorpAggregateParams, WindowParams};
use crate::error::{AppError, Result};
use crate::models::aggregate::CorporationAggregate;
use crate::models::per_member::{counts_by_name, InvoiceStats, MemberInvoice};
use crate::models::wallet::CorporationWalletEvent;
use crate::models::{CorpTaxPayoutTaxConfiguration, CorpTaxPerMemberTaxConfiguration};

async fn load_payout_configuration(
    pool: &PgPool,
    conf_id: i64,
) -> Result<CorpTaxPayoutTaxConfiguration> {
    CorpTaxPayoutTaxConfiguration::find_by_id(pool, conf_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Corporation payout tax configuration {} not found", conf_id))
        })
}

async fn load_member_configuration(
    pool: &PgPool,
    conf_id: i64,
) -> Result<CorpTaxPerMemberTaxConfiguration> {
    CorpTaxPerMemberTaxConfiguration::find_by_id(pool, conf_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Per-member tax configuration {} not found", conf_id))
        })
}

async fn get_corp_tax_data(
    State(state): State<AppState>,
    requester: Requester,
    Query(params): Query<WindowParams>,
) -> Result<Guarded<Vec<CorporationWalletEvent>>> {
    if let Some(denied) = Guarded::for_superuser(&requester, Empty::List) {
        return Ok(denied);
    }

    let start = params.start_date(Utc::now())?;
    let conf = load_payout_configuration(&state.pool, params.conf_id).await?;
    let events = conf.get_payment_data(&state.pool, start).await?;

    tracing::debug!(conf_id = conf.id, rows = events.len(), "Corporation tax list");

    Ok(Guarded::Allowed(events))
}

async fn get_corp_tax_aggregates(
    State(state): State<AppState>,
    requester: Requester,
    Query(params): Query<CorpAggregateParams>,
) -> Result<Guarded<Vec<CorporationAggregate>>> {
    if let Some(denied) = Guarded::for_superuser(&requester, Empty::List) {
        return Ok(denied);
    }

    let start = window_start(Utc::now(), params.days)?;
    let conf = load_payout_configuration(&state.pool, params.conf_id).await?;

    Ok(Guarded::Allowed(
        conf.get_aggregates(&state.pool, start, params.full).await?,
    ))
}

/// Main characters per corporation name
async fn get_corp_member_count(
    State(state): State<AppState>,
    requester: Requester,
    Query(params): Query<ConfParams>,
) -> Result<Guarded<BTreeMap<String, i64>>> {
    if let Some(denied) = Guarded::for_superuser(&requester, Empty::List) {
        return Ok(denied);
    }

    let conf = load_member_configuration(&state.pool, params.conf_id).await?;
    let counts = conf.get_main_counts(&state.pool).await?;

    Ok(Guarded::Allowed(counts_by_name(&counts)))
}

async fn get_corp_member_tax(
    State(state): State<AppState>,
    requester: Requester,
    Query(params): Query<ConfParams>,
) -> Result<Guarded<Vec<MemberInvoice>>> {
    if let Some(denied) = Guarded::for_superuser(&requester, Empty::List) {
        return Ok(denied);
    }

    let conf = load_member_configuration(&state.pool, params.conf_id).await?;

    Ok(Guarded::Allowed(conf.get_invoice_data(&state.pool).await?))
}

async fn get_corp_member_tax_aggregates(
    State(state): State<AppState>,
    requester: Requester,
    Query(params): Query<ConfParams>,
) -> Result<Guarded<InvoiceStats>> {
    if let Some(denied) = Guarded::for_superuser(&requester, Empty::List) {
        return Ok(denied);
    }

    let conf = load_member_configuration(&state.pool, params.conf_id).await?;

    Ok(Guarded::Allowed(conf.get_invoice_stats(&state.pool).await?))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/corp/tax/list", get(get_corp_tax_data))
        .route("/corp/tax/aggregates", get(get_corp_tax_aggregates))
        .route("/corp/member/count", get(get_corp_member_count))
        .route("/corp/member/tax", get(get_corp_member_tax))
        .route("/corp/member/tax/aggregate", get(get_corp_member_tax_aggregates))
}
