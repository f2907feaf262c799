use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::services::esi::EsiCorporation;

/// A corporation tracked by the platform
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EveCorporation {
    pub corporation_id: i64,
    pub corporation_name: String,
    pub alliance_id: Option<i64>,
    pub alliance_name: Option<String>,
    pub member_count: i32,
    pub updated_at: DateTime<Utc>,
}

impl EveCorporation {
    /// Lists every tracked corporation
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let corporations = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM eve_corporations
            ORDER BY corporation_id
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(corporations)
    }

    /// Loads the tracked corporations among `ids`
    pub async fn find_by_ids(pool: &PgPool, ids: &[i64]) -> Result<Vec<Self>, sqlx::Error> {
        let corporations = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM eve_corporations
            WHERE corporation_id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(pool)
        .await?;

        Ok(corporations)
    }

    /// Refreshes name, alliance and member count from the ESI corporation sheet.
    /// The alliance name is cleared when the alliance changed.
    pub async fn update_from_esi(
        pool: &PgPool,
        corporation_id: i64,
        sheet: &EsiCorporation,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE eve_corporations
            SET
                corporation_name = $2,
                alliance_name = CASE
                    WHEN alliance_id IS NOT DISTINCT FROM $3 THEN alliance_name
                    ELSE NULL
                END,
                alliance_id = $3,
                member_count = $4,
                updated_at = NOW()
            WHERE corporation_id = $1
            "#,
        )
        .bind(corporation_id)
        .bind(&sheet.name)
        .bind(sheet.alliance_id)
        .bind(sheet.member_count)
        .execute(pool)
        .await?;

        Ok(())
    }
}
