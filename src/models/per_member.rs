use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use super::aggregate::round_cents;

/// Flat fee per registered main character in each corporation
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CorpTaxPerMemberTaxConfiguration {
    pub id: i64,
    pub name: String,
    pub isk_per_main: Decimal,
    pub corporations: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct MainCount {
    pub corp_id: i64,
    pub corp_name: String,
    #[serde(rename = "character_id__count")]
    pub mains: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberInvoice {
    pub corp_id: i64,
    pub corp_name: String,
    pub mains: i64,
    pub isk_per_main: Decimal,
    pub tax: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceStats {
    pub corporations: usize,
    pub mains: i64,
    pub total_tax: Decimal,
    pub average_tax: Decimal,
}

/// Main counts keyed by corporation name
pub fn counts_by_name(counts: &[MainCount]) -> BTreeMap<String, i64> {
    counts
        .iter()
        .map(|c| (c.corp_name.clone(), c.mains))
        .collect()
}

pub fn invoices(counts: Vec<MainCount>, isk_per_main: Decimal) -> Vec<MemberInvoice> {
    counts
        .into_iter()
        .map(|c| MemberInvoice {
            tax: isk_per_main * Decimal::from(c.mains),
            corp_id: c.corp_id,
            corp_name: c.corp_name,
            mains: c.mains,
            isk_per_main,
        })
        .collect()
}

pub fn invoice_stats(invoices: &[MemberInvoice]) -> InvoiceStats {
    let mains = invoices.iter().map(|i| i.mains).sum();
    let total_tax: Decimal = invoices.iter().map(|i| i.tax).sum();
    let average_tax = if invoices.is_empty() {
        Decimal::ZERO
    } else {
        round_cents(total_tax / Decimal::from(invoices.len()))
    };

    InvoiceStats {
        corporations: invoices.len(),
        mains,
        total_tax,
        average_tax,
    }
}

impl CorpTaxPerMemberTaxConfiguration {
    /// Finds a configuration by ID
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let conf = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM corp_tax_per_member_tax_configurations WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(conf)
    }

    /// Active users' main characters counted per the main's corporation
    pub async fn get_main_counts(&self, pool: &PgPool) -> Result<Vec<MainCount>, sqlx::Error> {
        let counts = sqlx::query_as::<_, MainCount>(
            r#"
            SELECT
                c.corporation_id AS corp_id,
                c.corporation_name AS corp_name,
                COUNT(DISTINCT c.character_id) AS mains
            FROM users u
            JOIN eve_characters c ON c.character_id = u.main_character_id
            WHERE u.is_active
              AND (cardinality($1::BIGINT[]) = 0 OR c.corporation_id = ANY($1))
            GROUP BY c.corporation_id, c.corporation_name
            ORDER BY c.corporation_name
            "#,
        )
        .bind(&self.corporations)
        .fetch_all(pool)
        .await?;

        Ok(counts)
    }

    pub async fn get_invoice_data(&self, pool: &PgPool) -> Result<Vec<MemberInvoice>, sqlx::Error> {
        let counts = self.get_main_counts(pool).await?;
        Ok(invoices(counts, self.isk_per_main))
    }

    pub async fn get_invoice_stats(&self, pool: &PgPool) -> Result<InvoiceStats, sqlx::Error> {
        let invoices = self.get_invoice_data(pool).await?;
        Ok(invoice_stats(&invoices))
    }
}
