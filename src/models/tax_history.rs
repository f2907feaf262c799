use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

pub const SOURCE_JOURNAL: &str = "journal";
pub const SOURCE_ESI: &str = "esi";

/// Journal ref types whose `tax` column is withheld by the receiving corporation
pub const TAXED_REF_TYPES: &[&str] = &["bounty_prizes", "ess_escrow_transfer"];

/// A stored corporation tax rate, effective from `start_date` until the next row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CorpTaxHistory {
    pub id: i64,
    pub corporation_id: i64,
    pub start_date: DateTime<Utc>,
    pub tax_rate: Decimal,
    pub source: String, // "journal" or "esi"
    pub created_at: DateTime<Utc>,
}

/// An observed rate, not yet stored
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxRateChange {
    pub start_date: DateTime<Utc>,
    pub tax_rate: Decimal,
    pub source: &'static str,
}

#[derive(Debug, Clone, FromRow)]
pub struct TaxSample {
    pub date: DateTime<Utc>,
    pub amount: Decimal,
    pub tax: Decimal,
}

impl CorpTaxHistory {
    /// Stored history of one corporation, oldest first
    pub async fn get_corp_tax_list(
        pool: &PgPool,
        corporation_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let history = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM corp_tax_history
            WHERE corporation_id = $1
            ORDER BY start_date ASC
            "#,
        )
        .bind(corporation_id)
        .fetch_all(pool)
        .await?;

        Ok(history)
    }

    /// Taxed payouts received by the corporation, oldest first
    pub async fn tax_samples(
        pool: &PgPool,
        corporation_id: i64,
    ) -> Result<Vec<TaxSample>, sqlx::Error> {
        let samples = sqlx::query_as::<_, TaxSample>(
            r#"
            SELECT date, amount, tax
            FROM character_wallet_journal
            WHERE tax_receiver_id = $1
              AND tax IS NOT NULL
              AND ref_type = ANY($2)
            ORDER BY date ASC, entry_id ASC
            "#,
        )
        .bind(corporation_id)
        .bind(TAXED_REF_TYPES)
        .fetch_all(pool)
        .await?;

        Ok(samples)
    }

    /// Stores a rate change. Returns `None` when a row already exists for that start date.
    pub async fn insert(
        pool: &PgPool,
        corporation_id: i64,
        change: &TaxRateChange,
    ) -> Result<Option<Self>, sqlx::Error> {
        let row = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO corp_tax_history (corporation_id, start_date, tax_rate, source)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (corporation_id, start_date) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(corporation_id)
        .bind(change.start_date)
        .bind(change.tax_rate)
        .bind(change.source)
        .fetch_optional(pool)
        .await?;

        Ok(row)
    }
}
