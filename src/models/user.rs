use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

/// Host platform account; only the permission flags matter here
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub is_superuser: bool,
    pub is_active: bool,
    pub main_character_id: Option<i64>,
}

impl User {
    /// Finds a user by their internal ID
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, Self>(
            r#"
            SELECT id, username, is_superuser, is_active, main_character_id
            FROM users WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    pub fn is_privileged(&self) -> bool {
        self.is_active && self.is_superuser
    }
}
