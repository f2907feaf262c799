use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use crate::error::AppError;

pub const DEFAULT_DAYS: i64 = 90;
pub const DEFAULT_CONF_ID: i64 = 1;

fn default_days() -> i64 {
    DEFAULT_DAYS
}

fn default_conf_id() -> i64 {
    DEFAULT_CONF_ID
}

/// Start of a window reaching `days` back from `now`
pub fn window_start(now: DateTime<Utc>, days: i64) -> Result<DateTime<Utc>, AppError> {
    if days < 0 {
        return Err(AppError::Validation("days must not be negative".to_string()));
    }

    Duration::try_days(days)
        .and_then(|span| now.checked_sub_signed(span))
        .ok_or_else(|| AppError::Validation(format!("days out of range: {}", days)))
}

/// `?days=&conf_id=`
#[derive(Debug, Clone, Deserialize)]
pub struct WindowParams {
    #[serde(default = "default_days")]
    pub days: i64,
    #[serde(default = "default_conf_id")]
    pub conf_id: i64,
}

impl WindowParams {
    pub fn start_date(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, AppError> {
        window_start(now, self.days)
    }
}

/// `?conf_id=`
#[derive(Debug, Clone, Deserialize)]
pub struct ConfParams {
    #[serde(default = "default_conf_id")]
    pub conf_id: i64,
}

/// `?days=&conf_id=&full=`
#[derive(Debug, Clone, Deserialize)]
pub struct CorpAggregateParams {
    #[serde(default = "default_days")]
    pub days: i64,
    #[serde(default = "default_conf_id")]
    pub conf_id: i64,
    #[serde(default)]
    pub full: bool,
}

/// `?days=&conf_id=&alli_filter=`
#[derive(Debug, Clone, Deserialize)]
pub struct GlobalTaxParams {
    #[serde(default = "default_days")]
    pub days: i64,
    #[serde(default = "default_conf_id")]
    pub conf_id: i64,
    pub alli_filter: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::Uri;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_defaults() {
        let uri: Uri = "/char/tax/list".parse().unwrap();
        let Query(params) = Query::<WindowParams>::try_from_uri(&uri).unwrap();
        assert_eq!(params.days, 90);
        assert_eq!(params.conf_id, 1);

        let Query(params) = Query::<GlobalTaxParams>::try_from_uri(&uri).unwrap();
        assert_eq!(params.alli_filter, None);

        let Query(params) = Query::<CorpAggregateParams>::try_from_uri(&uri).unwrap();
        assert!(!params.full);
    }

    #[test]
    fn test_explicit_values() {
        let uri: Uri = "/global/corp/tax/aggregates?days=30&conf_id=4&alli_filter=99000001"
            .parse()
            .unwrap();
        let Query(params) = Query::<GlobalTaxParams>::try_from_uri(&uri).unwrap();
        assert_eq!(params.days, 30);
        assert_eq!(params.conf_id, 4);
        assert_eq!(params.alli_filter, Some(99000001));
    }

    #[test]
    fn test_non_numeric_days_rejected() {
        let uri: Uri = "/char/tax/list?days=ninety".parse().unwrap();
        assert!(Query::<WindowParams>::try_from_uri(&uri).is_err());
    }

    #[test]
    fn test_window_bounds() {
        assert_eq!(
            window_start(now(), 90).unwrap(),
            Utc.with_ymd_and_hms(2026, 7, 20, 12, 0, 0).unwrap()
        );
        assert_eq!(window_start(now(), 0).unwrap(), now());
        assert_eq!(
            window_start(now(), 1).unwrap(),
            Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_window_rejects_bad_days() {
        assert!(matches!(window_start(now(), -1), Err(AppError::Validation(_))));
        assert!(matches!(window_start(now(), i64::MAX), Err(AppError::Validation(_))));
    }
}
