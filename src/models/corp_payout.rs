use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use super::aggregate::{attach_ref_types, CorporationAggregate, CorporationSumRow, RefTypeSumRow};
use super::wallet::{CorporationWalletEvent, CorporationWalletEventRow};

/// Taxes a share of corporation journal income for the listed corporations,
/// or for every tracked corporation when the list is empty
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CorpTaxPayoutTaxConfiguration {
    pub id: i64,
    pub name: String,
    pub ref_types: Vec<String>,
    pub tax_rate: Decimal,
    pub corporations: Vec<i64>,
}

impl CorpTaxPayoutTaxConfiguration {
    /// Finds a configuration by ID
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let conf = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM corp_tax_payout_tax_configurations WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(conf)
    }

    /// Corporation journal entries taxed by this configuration since `start_date`
    pub async fn get_payment_data(
        &self,
        pool: &PgPool,
        start_date: DateTime<Utc>,
    ) -> Result<Vec<CorporationWalletEvent>, sqlx::Error> {
        let rows = sqlx::query_as::<_, CorporationWalletEventRow>(
            r#"
            SELECT
                co.corporation_name,
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
                j.reason,
                j.description
            FROM corporation_wallet_journal j
            JOIN eve_corporations co ON co.corporation_id = j.corporation_id
            LEFT JOIN eve_names fp ON fp.eve_id = j.first_party_id
            LEFT JOIN eve_names sp ON sp.eve_id = j.second_party_id
            WHERE j.ref_type = ANY($1)
              AND j.date >= $2
              AND (cardinality($3::BIGINT[]) = 0 OR j.corporation_id = ANY($3))
            ORDER BY j.date DESC, j.entry_id DESC
            "#,
        )
        .bind(&self.ref_types)
        .bind(start_date)
        .bind(&self.corporations)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(CorporationWalletEvent::from).collect())
    }

    /// Totals per corporation; `full` adds the per-ref-type breakdown
    pub async fn get_aggregates(
        &self,
        pool: &PgPool,
        start_date: DateTime<Utc>,
        full: bool,
    ) -> Result<Vec<CorporationAggregate>, sqlx::Error> {
        let rows = sqlx::query_as::<_, CorporationSumRow>(
            r#"
            SELECT
                co.corporation_id AS corp_id,
                co.corporation_name AS corp_name,
                SUM(j.amount) AS sum_amount,
                COUNT(j.id) AS cnt_amount
            FROM corporation_wallet_journal j
            JOIN eve_corporations co ON co.corporation_id = j.corporation_id
            WHERE j.ref_type = ANY($1)
              AND j.date >= $2
              AND (cardinality($3::BIGINT[]) = 0 OR j.corporation_id = ANY($3))
            GROUP BY co.corporation_id, co.corporation_name
            ORDER BY co.corporation_name
            "#,
        )
        .bind(&self.ref_types)
        .bind(start_date)
        .bind(&self.corporations)
        .fetch_all(pool)
        .await?;

        let mut aggregates: Vec<CorporationAggregate> = rows
            .into_iter()
            .map(|row| CorporationAggregate::from_row(row, self.tax_rate))
            .collect();

        if full {
            let breakdown = sqlx::query_as::<_, RefTypeSumRow>(
                r#"
                SELECT
                    j.corporation_id AS corp_id,
                    j.ref_type,
                    SUM(j.amount) AS sum_amount
                FROM corporation_wallet_journal j
                WHERE j.ref_type = ANY($1)
                  AND j.date >= $2
                  AND (cardinality($3::BIGINT[]) = 0 OR j.corporation_id = ANY($3))
                GROUP BY j.corporation_id, j.ref_type
                "#,
            )
            .bind(&self.ref_types)
            .bind(start_date)
            .bind(&self.corporations)
            .fetch_all(pool)
            .await?;

            attach_ref_types(&mut aggregates, breakdown);
        }

        Ok(aggregates)
    }
}
