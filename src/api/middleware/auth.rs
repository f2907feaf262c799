use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use tower_sessions::Session;

use super::session::{AppState, SESSION_KEY_USER_ID};
use crate::error::AppError;
use crate::models::User;

/// The user behind a request, resolved from the session.
///
/// Anonymous when the session carries no user id or the id is unknown.
#[derive(Debug, Clone, Default)]
pub struct Requester {
    pub user: Option<User>,
}

impl Requester {
    pub fn anonymous() -> Self {
        Self { user: None }
    }

    pub fn is_superuser(&self) -> bool {
        self.user.as_ref().is_some_and(User::is_privileged)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Requester {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| AppError::Session(msg.to_string()))?;

        let user_id: Option<i64> = session
            .get(SESSION_KEY_USER_ID)
            .await
            .map_err(|e| AppError::Session(e.to_string()))?;

        let Some(user_id) = user_id else {
            return Ok(Self::anonymous());
        };

        let user = User::find_by_id(&state.pool, user_id).await?;
        if user.is_none() {
            tracing::warn!(user_id, "Session refers to an unknown user");
        }

        Ok(Self { user })
    }
}

/// Shape of the body sent to callers without permission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Empty {
    List,
    Map,
}

/// A report body, or an empty body for callers who may not see it.
/// Both answer 200 so unauthorized callers cannot tell the cases apart.
#[derive(Debug)]
pub enum Guarded<T> {
    Denied(Empty),
    Allowed(T),
}

impl<T> Guarded<T> {
    /// Runs the report only for superusers
    pub fn for_superuser(requester: &Requester, empty: Empty) -> Option<Self> {
        if requester.is_superuser() {
            None
        } else {
            tracing::debug!("Non-superuser request answered with an empty body");
            Some(Guarded::Denied(empty))
        }
    }
}

impl<T: Serialize> IntoResponse for Guarded<T> {
    fn into_response(self) -> Response {
        match self {
            Guarded::Denied(Empty::List) => Json(json!([])).into_response(),
            Guarded::Denied(Empty::Map) => Json(json!({})).into_response(),
            Guarded::Allowed(body) => Json(body).into_response(),
        }
    }
}
