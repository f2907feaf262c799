use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;

use crate::error::AppError;
use crate::models::{
    corporation::EveCorporation,
    tax_history::{CorpTaxHistory, TaxRateChange, TaxSample, SOURCE_ESI, SOURCE_JOURNAL},
};
use crate::services::esi::{EsiClient, EsiError};

#[derive(Error, Debug)]
pub enum TaxHistoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("ESI error: {0}")]
    Esi(#[from] EsiError),
}

impl From<TaxHistoryError> for AppError {
    fn from(e: TaxHistoryError) -> Self {
        match e {
            TaxHistoryError::Database(e) => AppError::Database(e),
            TaxHistoryError::Esi(e) => AppError::Esi(e),
        }
    }
}

/// Result of syncing one corporation during a bulk sync
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncOutcome {
    Synced { added: usize },
    Failed { error: String },
}

/// Rates are compared and stored at whole-percent precision
pub fn round_rate(rate: Decimal) -> Decimal {
    rate.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Rate withheld from one payout: `tax / (amount + tax)`, as a whole percent fraction
pub fn withheld_rate(sample: &TaxSample) -> Option<Decimal> {
    let gross = sample.amount + sample.tax;
    if gross <= Decimal::ZERO {
        return None;
    }
    Some(round_rate(sample.tax / gross))
}

/// Candidate entry for the rate ESI currently reports
pub fn current_rate_change(tax_rate: Decimal, now: DateTime<Utc>) -> TaxRateChange {
    TaxRateChange {
        start_date: now,
        tax_rate: round_rate(tax_rate),
        source: SOURCE_ESI,
    }
}

/// Walks samples oldest-first and emits the first rate and every later change
pub fn detect_rate_changes(samples: &[TaxSample]) -> Vec<TaxRateChange> {
    let mut changes: Vec<TaxRateChange> = Vec::new();

    for sample in samples {
        let Some(rate) = withheld_rate(sample) else {
            continue;
        };

        if changes.last().map(|c| c.tax_rate) != Some(rate) {
            changes.push(TaxRateChange {
                start_date: sample.date,
                tax_rate: rate,
                source: SOURCE_JOURNAL,
            });
        }
    }

    changes
}

/// Keeps the candidates whose rate differs from the rate in effect at their date.
///
/// The rate in effect is taken from the stored history together with the
/// candidates accepted so far. Candidates on an already stored date are skipped.
pub fn select_new_entries(
    existing: &[CorpTaxHistory],
    mut candidates: Vec<TaxRateChange>,
) -> Vec<TaxRateChange> {
    candidates.sort_by_key(|c| c.start_date);

    let mut known: Vec<(DateTime<Utc>, Decimal)> = existing
        .iter()
        .map(|h| (h.start_date, h.tax_rate))
        .collect();
    let mut accepted = Vec::new();

    for candidate in candidates {
        if known.iter().any(|(date, _)| *date == candidate.start_date) {
            continue;
        }

        let in_effect = known
            .iter()
            .filter(|(date, _)| *date <= candidate.start_date)
            .max_by_key(|(date, _)| *date)
            .map(|(_, rate)| *rate);

        if in_effect != Some(candidate.tax_rate) {
            known.push((candidate.start_date, candidate.tax_rate));
            accepted.push(candidate);
        }
    }

    accepted
}

/// Rate changes implied by the journal, without storing them
pub async fn find_corp_tax_changes(
    pool: &PgPool,
    corporation_id: i64,
) -> Result<Vec<TaxRateChange>, sqlx::Error> {
    let samples = CorpTaxHistory::tax_samples(pool, corporation_id).await?;
    Ok(detect_rate_changes(&samples))
}

/// Stores journal-detected changes and the current ESI rate when they are new.
/// Returns the rows that were added.
pub async fn sync_corp_tax_changes(
    pool: &PgPool,
    esi: &EsiClient,
    corporation_id: i64,
) -> Result<Vec<CorpTaxHistory>, TaxHistoryError> {
    let sheet = esi.corporation(corporation_id).await?;
    EveCorporation::update_from_esi(pool, corporation_id, &sheet).await?;

    let existing = CorpTaxHistory::get_corp_tax_list(pool, corporation_id).await?;
    let mut candidates = find_corp_tax_changes(pool, corporation_id).await?;
    candidates.push(current_rate_change(sheet.tax_rate, Utc::now()));

    let mut added = Vec::new();
    for change in select_new_entries(&existing, candidates) {
        if let Some(row) = CorpTaxHistory::insert(pool, corporation_id, &change).await? {
            added.push(row);
        }
    }

    tracing::info!(
        corporation_id,
        added = added.len(),
        current_rate = %sheet.tax_rate,
        "Corporation tax history synced"
    );

    Ok(added)
}

/// Syncs every tracked corporation; failures are recorded per corporation
pub async fn sync_all_corps(
    pool: &PgPool,
    esi: &EsiClient,
) -> Result<BTreeMap<i64, SyncOutcome>, sqlx::Error> {
    let corporations = EveCorporation::list_all(pool).await?;
    let mut output = BTreeMap::new();

    for corp in corporations {
        let outcome = match sync_corp_tax_changes(pool, esi, corp.corporation_id).await {
            Ok(added) => SyncOutcome::Synced { added: added.len() },
            Err(e) => {
                tracing::error!(
                    corporation_id = corp.corporation_id,
                    error = %e,
                    "Corporation tax history sync failed"
                );
                SyncOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };
        output.insert(corp.corporation_id, outcome);
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + Duration::days(n)
    }

    fn sample(n: i64, amount: i64, tax: i64) -> TaxSample {
        TaxSample {
            date: day(n),
            amount: Decimal::new(amount, 0),
            tax: Decimal::new(tax, 0),
        }
    }

    fn stored(n: i64, rate: i64) -> CorpTaxHistory {
        CorpTaxHistory {
            id: n,
            corporation_id: 98000001,
            start_date: day(n),
            tax_rate: Decimal::new(rate, 2),
            source: SOURCE_JOURNAL.to_string(),
            created_at: day(n),
        }
    }

    fn candidate(n: i64, rate: i64) -> TaxRateChange {
        TaxRateChange {
            start_date: day(n),
            tax_rate: Decimal::new(rate, 2),
            source: SOURCE_JOURNAL,
        }
    }

    #[test]
    fn test_withheld_rate() {
        assert_eq!(withheld_rate(&sample(0, 900, 100)), Some(Decimal::new(10, 2)));
        assert_eq!(withheld_rate(&sample(0, 1000, 0)), Some(Decimal::ZERO));
        assert_eq!(withheld_rate(&sample(0, 0, 0)), None);
    }

    #[test]
    fn test_detect_emits_only_on_change() {
        let changes = detect_rate_changes(&[
            sample(0, 900, 100),
            sample(1, 1800, 200),
            sample(2, 950, 50),
            sample(3, 0, 0),
            sample(4, 1900, 100),
            sample(5, 900, 100),
        ]);

        let rates: Vec<(DateTime<Utc>, Decimal)> =
            changes.iter().map(|c| (c.start_date, c.tax_rate)).collect();
        assert_eq!(
            rates,
            vec![
                (day(0), Decimal::new(10, 2)),
                (day(2), Decimal::new(5, 2)),
                (day(5), Decimal::new(10, 2)),
            ]
        );
        assert!(changes.iter().all(|c| c.source == SOURCE_JOURNAL));
    }

    #[test]
    fn test_detect_without_samples() {
        assert!(detect_rate_changes(&[]).is_empty());
    }

    #[test]
    fn test_select_skips_known_rates() {
        let existing = vec![stored(0, 10), stored(10, 5)];
        let selected = select_new_entries(
            &existing,
            vec![candidate(3, 10), candidate(12, 5), candidate(20, 7)],
        );

        assert_eq!(selected, vec![candidate(20, 7)]);
    }

    #[test]
    fn test_select_accepts_chain_of_changes() {
        let selected = select_new_entries(
            &[],
            vec![candidate(4, 5), candidate(0, 10), candidate(8, 5)],
        );

        assert_eq!(selected, vec![candidate(0, 10), candidate(4, 5)]);
    }

    #[test]
    fn test_select_skips_stored_dates() {
        let selected = select_new_entries(&[stored(0, 10)], vec![candidate(0, 15)]);
        assert!(selected.is_empty());
    }

    #[test]
    fn test_esi_rate_matches_journal_precision() {
        // 7.5% withheld rounds to 8% in the journal; ESI reports 0.075
        assert_eq!(withheld_rate(&sample(0, 925, 75)), Some(Decimal::new(8, 2)));

        let current = current_rate_change(Decimal::new(75, 3), day(30));
        assert_eq!(current.tax_rate, Decimal::new(8, 2));
        assert_eq!(current.source, SOURCE_ESI);

        let journal = detect_rate_changes(&[sample(0, 925, 75)]);
        let mut candidates = journal.clone();
        candidates.push(current);
        assert_eq!(select_new_entries(&[], candidates), journal);
    }

    #[test]
    fn test_sync_outcome_json() {
        let synced = serde_json::to_value(SyncOutcome::Synced { added: 2 }).unwrap();
        assert_eq!(synced, serde_json::json!({"status": "synced", "added": 2}));

        let failed = serde_json::to_value(SyncOutcome::Failed {
            error: "timeout".to_string(),
        })
        .unwrap();
        assert_eq!(failed["status"], "failed");
    }
}
