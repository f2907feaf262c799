//! Wallet journal rows as returned by the payment listing queries.
//!
//! Party names come from `eve_names` through a left join, so every display
//! field is optional.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// First or second party of a journal entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Party {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub cat: Option<String>,
}

impl Party {
    fn new(id: Option<i64>, name: Option<String>, cat: Option<String>) -> Self {
        Self { id, name, cat }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct CharacterWalletEventRow {
    pub character_name: String,
    pub entry_id: i64,
    pub date: DateTime<Utc>,
    pub first_party_id: Option<i64>,
    pub first_party_name: Option<String>,
    pub first_party_category: Option<String>,
    pub second_party_id: Option<i64>,
    pub second_party_name: Option<String>,
    pub second_party_category: Option<String>,
    pub ref_type: String,
    pub amount: Decimal,
    pub balance: Decimal,
    pub reason: String,
}

/// A character journal entry that matched a payout configuration
#[derive(Debug, Clone, Serialize)]
pub struct CharacterWalletEvent {
    pub character: String,
    pub id: i64,
    pub date: DateTime<Utc>,
    pub first_party: Party,
    pub second_party: Party,
    pub ref_type: String,
    pub amount: Decimal,
    pub balance: Decimal,
    pub reason: String,
}

impl From<CharacterWalletEventRow> for CharacterWalletEvent {
    fn from(row: CharacterWalletEventRow) -> Self {
        Self {
            character: row.character_name,
            id: row.entry_id,
            date: row.date,
            first_party: Party::new(
                row.first_party_id,
                row.first_party_name,
                row.first_party_category,
            ),
            second_party: Party::new(
                row.second_party_id,
                row.second_party_name,
                row.second_party_category,
            ),
            ref_type: row.ref_type,
            amount: row.amount,
            balance: row.balance,
            reason: row.reason,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct CorporationWalletEventRow {
    pub corporation_name: String,
    pub entry_id: i64,
    pub date: DateTime<Utc>,
    pub first_party_id: Option<i64>,
    pub first_party_name: Option<String>,
    pub first_party_category: Option<String>,
    pub second_party_id: Option<i64>,
    pub second_party_name: Option<String>,
    pub second_party_category: Option<String>,
    pub ref_type: String,
    pub amount: Decimal,
    pub reason: String,
    pub description: String,
}

/// A corporation journal entry that matched a payout configuration
#[derive(Debug, Clone, Serialize)]
pub struct CorporationWalletEvent {
    pub corporation: String,
    pub id: i64,
    pub date: DateTime<Utc>,
    pub first_party: Party,
    pub second_party: Party,
    pub ref_type: String,
    pub amount: Decimal,
    pub reason: String,
    pub description: String,
}

impl From<CorporationWalletEventRow> for CorporationWalletEvent {
    fn from(row: CorporationWalletEventRow) -> Self {
        Self {
            corporation: row.corporation_name,
            id: row.entry_id,
            date: row.date,
            first_party: Party::new(
                row.first_party_id,
                row.first_party_name,
                row.first_party_category,
            ),
            second_party: Party::new(
                row.second_party_id,
                row.second_party_name,
                row.second_party_category,
            ),
            ref_type: row.ref_type,
            amount: row.amount,
            reason: row.reason,
            description: row.description,
        }
    }
}
