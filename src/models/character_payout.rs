use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use super::aggregate::{CharacterAggregate, CharacterSumRow, CorporationAggregate, CorporationSumRow};
use super::wallet::{CharacterWalletEvent, CharacterWalletEventRow};

/// Taxes a share of character journal payouts (bounties, ESS, ...)
/// for the listed corporations, or for every character when the list is empty
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CharacterPayoutTaxConfiguration {
    pub id: i64,
    pub name: String,
    pub ref_types: Vec<String>,
    pub tax_rate: Decimal,
    pub corporations: Vec<i64>,
}

impl CharacterPayoutTaxConfiguration {
    /// Finds a configuration by ID
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let conf = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM character_payout_tax_configurations WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(conf)
    }

    /// Journal entries taxed by this configuration since `start_date`, newest first
    pub async fn get_payment_data(
        &self,
        pool: &PgPool,
        start_date: DateTime<Utc>,
    ) -> Result<Vec<CharacterWalletEvent>, sqlx::Error> {
        let rows = sqlx::query_as::<_, CharacterWalletEventRow>(
            r#"
            SELECT
                c.character_name,
                j.entry_id,
                j.date,
                j.first_party_id,
                fp.name AS first_party_name,
                fp.category AS first_party_category,
                j.second_party_id,
                sp.name AS second_party_name,
                sp.category AS second_party_category,
                j.ref_type,
                j.amount,
                j.balance,
                j.reason
            FROM character_wallet_journal j
            JOIN eve_characters c ON c.character_id = j.character_id
            LEFT JOIN eve_names fp ON fp.eve_id = j.first_party_id
            LEFT JOIN eve_names sp ON sp.eve_id = j.second_party_id
            WHERE j.ref_type = ANY($1)
              AND j.date >= $2
              AND (cardinality($3::BIGINT[]) = 0 OR c.corporation_id = ANY($3))
            ORDER BY j.date DESC, j.entry_id DESC
            "#,
        )
        .bind(&self.ref_types)
        .bind(start_date)
        .bind(&self.corporations)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(CharacterWalletEvent::from).collect())
    }

    async fn character_sums(
        &self,
        pool: &PgPool,
        start_date: DateTime<Utc>,
    ) -> Result<Vec<CharacterAggregate>, sqlx::Error> {
        let rows = sqlx::query_as::<_, CharacterSumRow>(
            r#"
            SELECT
                c.character_id AS char_id,
                c.character_name AS char_name,
                c.corporation_id AS corp_id,
                c.corporation_name AS corp_name,
                SUM(j.amount) AS sum_amount,
                COUNT(j.id) AS cnt_amount
            FROM character_wallet_journal j
            JOIN eve_characters c ON c.character_id = j.character_id
            WHERE j.ref_type = ANY($1)
              AND j.date >= $2
              AND (cardinality($3::BIGINT[]) = 0 OR c.corporation_id = ANY($3))
            GROUP BY c.character_id, c.character_name, c.corporation_id, c.corporation_name
            ORDER BY c.corporation_name, c.character_name
            "#,
        )
        .bind(&self.ref_types)
        .bind(start_date)
        .bind(&self.corporations)
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| CharacterAggregate::from_row(row, self.tax_rate))
            .collect())
    }

    /// Per-character totals, largest earners first
    pub async fn get_character_aggregates(
        &self,
        pool: &PgPool,
        start_date: DateTime<Utc>,
    ) -> Result<Vec<CharacterAggregate>, sqlx::Error> {
        let mut aggregates = self.character_sums(pool, start_date).await?;
        aggregates.sort_by(|a, b| b.sum_amount.cmp(&a.sum_amount));
        Ok(aggregates)
    }

    /// Totals per corporation of the paid characters
    pub async fn get_character_aggregates_corp_level(
        &self,
        pool: &PgPool,
        start_date: DateTime<Utc>,
    ) -> Result<Vec<CorporationAggregate>, sqlx::Error> {
        let rows = sqlx::query_as::<_, CorporationSumRow>(
            r#"
            SELECT
                c.corporation_id AS corp_id,
                c.corporation_name AS corp_name,
                SUM(j.amount) AS sum_amount,
                COUNT(j.id) AS cnt_amount
            FROM character_wallet_journal j
            JOIN eve_characters c ON c.character_id = j.character_id
            WHERE j.ref_type = ANY($1)
              AND j.date >= $2
              AND (cardinality($3::BIGINT[]) = 0 OR c.corporation_id = ANY($3))
            GROUP BY c.corporation_id, c.corporation_name
            ORDER BY c.corporation_name
            "#,
        )
        .bind(&self.ref_types)
        .bind(start_date)
        .bind(&self.corporations)
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| CorporationAggregate::from_row(row, self.tax_rate))
            .collect())
    }

    /// Per-character totals ordered by corporation then character, ready for grouping
    pub async fn get_aggregates(
        &self,
        pool: &PgPool,
        start_date: DateTime<Utc>,
    ) -> Result<Vec<CharacterAggregate>, sqlx::Error> {
        self.character_sums(pool, start_date).await
    }
}
