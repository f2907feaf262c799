use std::collections::BTreeMap;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use sqlx::FromRow;

/// Rounds an ISK amount to whole cents, halves away from zero
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds `amount * rate` to whole cents
pub fn tax_on(amount: Decimal, rate: Decimal) -> Decimal {
    round_cents(amount * rate)
}

#[derive(Debug, Clone, FromRow)]
pub struct CharacterSumRow {
    pub char_id: i64,
    pub char_name: String,
    pub corp_id: i64,
    pub corp_name: String,
    pub sum_amount: Decimal,
    pub cnt_amount: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct CorporationSumRow {
    pub corp_id: i64,
    pub corp_name: String,
    pub sum_amount: Decimal,
    pub cnt_amount: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct RefTypeSumRow {
    pub corp_id: i64,
    pub ref_type: String,
    pub sum_amount: Decimal,
}

/// Payout totals for one character over the window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CharacterAggregate {
    pub char_id: i64,
    #[serde(rename = "char")]
    pub char_name: String,
    pub corp_id: i64,
    #[serde(rename = "corp")]
    pub corp_name: String,
    pub sum_amount: Decimal,
    pub tax_amount: Decimal,
    pub cnt_amount: i64,
}

impl CharacterAggregate {
    pub fn from_row(row: CharacterSumRow, rate: Decimal) -> Self {
        Self {
            char_id: row.char_id,
            char_name: row.char_name,
            corp_id: row.corp_id,
            corp_name: row.corp_name,
            tax_amount: tax_on(row.sum_amount, rate),
            sum_amount: row.sum_amount,
            cnt_amount: row.cnt_amount,
        }
    }
}

/// Payout totals for one corporation over the window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorporationAggregate {
    pub corp_id: i64,
    #[serde(rename = "corp")]
    pub corp_name: String,
    pub sum_amount: Decimal,
    pub tax_amount: Decimal,
    pub cnt_amount: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_types: Option<BTreeMap<String, Decimal>>,
}

impl CorporationAggregate {
    pub fn from_row(row: CorporationSumRow, rate: Decimal) -> Self {
        Self {
            corp_id: row.corp_id,
            corp_name: row.corp_name,
            tax_amount: tax_on(row.sum_amount, rate),
            sum_amount: row.sum_amount,
            cnt_amount: row.cnt_amount,
            ref_types: None,
        }
    }
}

/// Characters of one corporation with their summed payouts
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CorporationGroup {
    pub characters: Vec<String>,
    pub sum: Decimal,
    pub tax: Decimal,
    pub cnt: i64,
}

/// Regroups per-character aggregates under their corporation name
pub fn group_by_corporation(rows: &[CharacterAggregate]) -> BTreeMap<String, CorporationGroup> {
    let mut output: BTreeMap<String, CorporationGroup> = BTreeMap::new();

    for row in rows {
        let group = output.entry(row.corp_name.clone()).or_default();
        group.characters.push(row.char_name.clone());
        group.sum += row.sum_amount;
        group.tax += row.tax_amount;
        group.cnt += row.cnt_amount;
    }

    output
}

/// Attaches per-ref-type sums to the matching corporation aggregates
pub fn attach_ref_types(aggregates: &mut [CorporationAggregate], rows: Vec<RefTypeSumRow>) {
    for aggregate in aggregates.iter_mut() {
        aggregate.ref_types.get_or_insert_with(BTreeMap::new);
    }

    for row in rows {
        if let Some(aggregate) = aggregates.iter_mut().find(|a| a.corp_id == row.corp_id) {
            *aggregate
                .ref_types
                .get_or_insert_with(BTreeMap::new)
                .entry(row.ref_type)
                .or_default() += row.sum_amount;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn character(char_name: &str, corp_id: i64, corp_name: &str, sum: i64, cnt: i64) -> CharacterAggregate {
        CharacterAggregate::from_row(
            CharacterSumRow {
                char_id: 0,
                char_name: char_name.to_string(),
                corp_id,
                corp_name: corp_name.to_string(),
                sum_amount: Decimal::new(sum, 2),
                cnt_amount: cnt,
            },
            Decimal::new(10, 2),
        )
    }

    #[test]
    fn test_round_cents_halves_away_from_zero() {
        assert_eq!(round_cents(Decimal::new(25, 3)), Decimal::new(3, 2));
        assert_eq!(round_cents(Decimal::new(-25, 3)), Decimal::new(-3, 2));
    }

    #[test]
    fn test_tax_on_rounds_to_cents() {
        assert_eq!(tax_on(Decimal::new(12345, 2), Decimal::new(10, 2)), Decimal::new(1235, 2));
        assert_eq!(tax_on(Decimal::new(100, 0), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_group_sums_match_member_rows() {
        let rows = vec![
            character("Alpha", 1, "Red Corp", 1_000_000, 4),
            character("Bravo", 2, "Blue Corp", 250_050, 1),
            character("Charlie", 1, "Red Corp", 333_333, 2),
        ];

        let groups = group_by_corporation(&rows);

        assert_eq!(groups.len(), 2);
        for (corp, group) in &groups {
            let members: Vec<&CharacterAggregate> =
                rows.iter().filter(|r| &r.corp_name == corp).collect();
            assert_eq!(group.sum, members.iter().map(|r| r.sum_amount).sum::<Decimal>());
            assert_eq!(group.tax, members.iter().map(|r| r.tax_amount).sum::<Decimal>());
            assert_eq!(group.cnt, members.iter().map(|r| r.cnt_amount).sum::<i64>());
        }

        let red = &groups["Red Corp"];
        assert_eq!(red.characters, vec!["Alpha".to_string(), "Charlie".to_string()]);
        assert_eq!(red.cnt, 6);
    }

    #[test]
    fn test_large_sums_keep_their_cents() {
        let group = CorporationGroup {
            characters: vec!["Alpha".to_string()],
            sum: Decimal::from_str("98765432109876.54").unwrap(),
            tax: Decimal::from_str("1234567890123456.78").unwrap(),
            cnt: 3,
        };

        let body = serde_json::to_string(&group).unwrap();
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["sum"], "98765432109876.54");
        assert_eq!(json["tax"], "1234567890123456.78");

        let sum = json["sum"].as_str().unwrap();
        assert_eq!(Decimal::from_str(sum).unwrap(), group.sum);
    }

    #[test]
    fn test_group_of_nothing_is_empty() {
        assert!(group_by_corporation(&[]).is_empty());
    }

    #[test]
    fn test_attach_ref_types() {
        let mut aggregates = vec![CorporationAggregate::from_row(
            CorporationSumRow {
                corp_id: 7,
                corp_name: "Red Corp".to_string(),
                sum_amount: Decimal::new(300, 0),
                cnt_amount: 3,
            },
            Decimal::new(5, 2),
        )];

        attach_ref_types(
            &mut aggregates,
            vec![
                RefTypeSumRow {
                    corp_id: 7,
                    ref_type: "bounty_prizes".to_string(),
                    sum_amount: Decimal::new(200, 0),
                },
                RefTypeSumRow {
                    corp_id: 7,
                    ref_type: "ess_escrow_transfer".to_string(),
                    sum_amount: Decimal::new(100, 0),
                },
                RefTypeSumRow {
                    corp_id: 8,
                    ref_type: "bounty_prizes".to_string(),
                    sum_amount: Decimal::new(999, 0),
                },
            ],
        );

        let breakdown = aggregates[0].ref_types.as_ref().unwrap();
        assert_eq!(breakdown.len(), 2);
        assert_eq!(breakdown["bounty_prizes"], Decimal::new(200, 0));
        assert_eq!(aggregates[0].tax_amount, Decimal::new(15, 0));
    }

    #[test]
    fn test_aggregate_json_keys() {
        let json = serde_json::to_value(character("Alpha", 1, "Red Corp", 1000, 1)).unwrap();
        assert_eq!(json["char"], "Alpha");
        assert_eq!(json["corp"], "Red Corp");
        assert!(json.get("char_name").is_none());
        assert!(json.get("corp_name").is_none());
        assert!(json.get("sum_amount").is_some());
        assert!(json.get("tax_amount").is_some());
        assert_eq!(json["cnt_amount"], 1);
    }
}
