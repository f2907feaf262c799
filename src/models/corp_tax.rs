use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use super::aggregate::CorporationAggregate;
use super::character_payout::CharacterPayoutTaxConfiguration;
use super::corp_payout::CorpTaxPayoutTaxConfiguration;
use super::corporation::EveCorporation;
use super::per_member::{CorpTaxPerMemberTaxConfiguration, MemberInvoice};

/// Bundles the three tax sources into one bill per corporation
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CorpTaxConfiguration {
    pub id: i64,
    pub name: String,
    pub character_taxes_id: Option<i64>,
    pub corporate_taxes_id: Option<i64>,
    pub member_taxes_id: Option<i64>,
    pub exempt_corporations: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorporationTaxSummary {
    pub corporation_id: i64,
    pub corporation_name: String,
    pub alliance_id: Option<i64>,
    pub alliance_name: Option<String>,
    pub character_tax: Decimal,
    pub corporate_tax: Decimal,
    pub member_tax: Decimal,
    pub total_tax: Decimal,
}

impl CorporationTaxSummary {
    fn new(corporation_id: i64, corporation_name: &str) -> Self {
        Self {
            corporation_id,
            corporation_name: corporation_name.to_string(),
            alliance_id: None,
            alliance_name: None,
            character_tax: Decimal::ZERO,
            corporate_tax: Decimal::ZERO,
            member_tax: Decimal::ZERO,
            total_tax: Decimal::ZERO,
        }
    }
}

/// Merges the three tax sources by corporation id.
///
/// Exempt corporations are dropped. With an alliance filter, only corporations
/// known to be in that alliance are kept.
pub fn merge_taxes(
    character_taxes: &[CorporationAggregate],
    corporate_taxes: &[CorporationAggregate],
    member_taxes: &[MemberInvoice],
    corporations: &HashMap<i64, EveCorporation>,
    exempt: &[i64],
    alliance_filter: Option<i64>,
) -> BTreeMap<i64, CorporationTaxSummary> {
    let mut output: BTreeMap<i64, CorporationTaxSummary> = BTreeMap::new();

    for agg in character_taxes {
        output
            .entry(agg.corp_id)
            .or_insert_with(|| CorporationTaxSummary::new(agg.corp_id, &agg.corp_name))
            .character_tax += agg.tax_amount;
    }
    for agg in corporate_taxes {
        output
            .entry(agg.corp_id)
            .or_insert_with(|| CorporationTaxSummary::new(agg.corp_id, &agg.corp_name))
            .corporate_tax += agg.tax_amount;
    }
    for invoice in member_taxes {
        output
            .entry(invoice.corp_id)
            .or_insert_with(|| CorporationTaxSummary::new(invoice.corp_id, &invoice.corp_name))
            .member_tax += invoice.tax;
    }

    output.retain(|corp_id, _| !exempt.contains(corp_id));

    for summary in output.values_mut() {
        if let Some(corp) = corporations.get(&summary.corporation_id) {
            summary.alliance_id = corp.alliance_id;
            summary.alliance_name = corp.alliance_name.clone();
        }
        summary.total_tax = summary.character_tax + summary.corporate_tax + summary.member_tax;
    }

    if let Some(alliance_id) = alliance_filter {
        output.retain(|_, summary| summary.alliance_id == Some(alliance_id));
    }

    output
}

impl CorpTaxConfiguration {
    /// Finds a configuration by ID
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let conf = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM corp_tax_configurations WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(conf)
    }

    /// Tax owed per corporation since `start_date`, optionally limited to one alliance.
    /// Unlinked sources contribute nothing.
    pub async fn calculate_tax(
        &self,
        pool: &PgPool,
        start_date: DateTime<Utc>,
        alliance_filter: Option<i64>,
    ) -> Result<BTreeMap<i64, CorporationTaxSummary>, sqlx::Error> {
        let character_taxes = match self.character_taxes_id {
            Some(id) => match CharacterPayoutTaxConfiguration::find_by_id(pool, id).await? {
                Some(conf) => {
                    conf.get_character_aggregates_corp_level(pool, start_date)
                        .await?
                }
                None => Vec::new(),
            },
            None => Vec::new(),
        };

        let corporate_taxes = match self.corporate_taxes_id {
            Some(id) => match CorpTaxPayoutTaxConfiguration::find_by_id(pool, id).await? {
                Some(conf) => conf.get_aggregates(pool, start_date, false).await?,
                None => Vec::new(),
            },
            None => Vec::new(),
        };

        let member_taxes = match self.member_taxes_id {
            Some(id) => match CorpTaxPerMemberTaxConfiguration::find_by_id(pool, id).await? {
                Some(conf) => conf.get_invoice_data(pool).await?,
                None => Vec::new(),
            },
            None => Vec::new(),
        };

        let mut ids: Vec<i64> = character_taxes
            .iter()
            .map(|a| a.corp_id)
            .chain(corporate_taxes.iter().map(|a| a.corp_id))
            .chain(member_taxes.iter().map(|i| i.corp_id))
            .collect();
        ids.sort_unstable();
        ids.dedup();

        let corporations: HashMap<i64, EveCorporation> = EveCorporation::find_by_ids(pool, &ids)
            .await?
            .into_iter()
            .map(|c| (c.corporation_id, c))
            .collect();

        Ok(merge_taxes(
            &character_taxes,
            &corporate_taxes,
            &member_taxes,
            &corporations,
            &self.exempt_corporations,
            alliance_filter,
        ))
    }
}
