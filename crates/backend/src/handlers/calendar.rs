use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{DateTime, Duration, Utc};
use shared_types::{CalendarQuery, CalendarResponse, DashboardSummary};

use crate::auth::AuthUser;
use crate::db::{self, get_conn};
use crate::error::{ApiError, ApiResult};
use crate::services::schedule::{self, MAX_CALENDAR_WINDOW_DAYS};
use crate::AppState;

/// Resolve the requested window, defaulting to the current week.
pub fn calendar_window(
    query: &CalendarQuery,
    now: DateTime<Utc>,
) -> ApiResult<(DateTime<Utc>, DateTime<Utc>)> {
    let (week_start, week_end) = schedule::week_bounds(now);
    let out_of_range = || ApiError::bad_request("calendar window is out of range");
    let (from, to) = match (query.from, query.to) {
        (Some(from), Some(to)) => (from, to),
        (Some(from), None) => (
            from,
            from.checked_add_signed(Duration::days(7))
                .ok_or_else(out_of_range)?,
        ),
        (None, Some(to)) => (
            to.checked_sub_signed(Duration::days(7))
                .ok_or_else(out_of_range)?,
            to,
        ),
        (None, None) => (week_start, week_end),
    };

    if to <= from {
        return Err(ApiError::bad_request("`to` must be after `from`"));
    }
    if to - from > Duration::days(MAX_CALENDAR_WINDOW_DAYS) {
        return Err(ApiError::bad_request(format!(
            "calendar window cannot exceed {} days",
            MAX_CALENDAR_WINDOW_DAYS
        )));
    }
    Ok((from, to))
}

pub async fn get_calendar(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<CalendarQuery>,
) -> ApiResult<Json<CalendarResponse>> {
    let (from, to) = calendar_window(&query, Utc::now())?;

    let mut conn = get_conn(&state.pool).await?;
    let workplaces = db::workplaces::list_for_user(&mut conn, user.id).await?;
    let shifts = db::shifts::list_for_user(&mut conn, user.id, None).await?;
    let sessions = db::study_sessions::list_for_user(&mut conn, user.id).await?;

    let entries = schedule::build_calendar(&shifts, &sessions, &workplaces, from, to);
    tracing::debug!(count = entries.len(), %from, %to, "Built calendar");

    Ok(Json(CalendarResponse { from, to, entries }))
}

pub async fn get_dashboard(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<DashboardSummary>> {
    let mut conn = get_conn(&state.pool).await?;
    let workplaces = db::workplaces::list_for_user(&mut conn, user.id).await?;
    let shifts = db::shifts::list_for_user(&mut conn, user.id, None).await?;
    let sessions = db::study_sessions::list_for_user(&mut conn, user.id).await?;

    Ok(Json(schedule::dashboard_summary(
        &shifts,
        &sessions,
        &workplaces,
        Utc::now(),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_window_defaults_to_current_week() {
        let (from, to) = calendar_window(&CalendarQuery::default(), now()).unwrap();
        assert_eq!(from, Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap());
        assert_eq!(to, Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_window_limits() {
        let from = now();
        let ok = CalendarQuery {
            from: Some(from),
            to: Some(from + Duration::days(366)),
        };
        assert!(calendar_window(&ok, now()).is_ok());

        let too_long = CalendarQuery {
            from: Some(from),
            to: Some(from + Duration::days(367)),
        };
        assert!(matches!(
            calendar_window(&too_long, now()),
            Err(ApiError::BadRequest(_))
        ));

        let inverted = CalendarQuery {
            from: Some(from),
            to: Some(from - Duration::hours(1)),
        };
        assert!(calendar_window(&inverted, now()).is_err());
    }

    #[test]
    fn test_window_single_bound() {
        let from = now();
        let (_, to) = calendar_window(
            &CalendarQuery {
                from: Some(from),
                to: None,
            },
            now(),
        )
        .unwrap();
        assert_eq!(to, from + Duration::days(7));
    }

    #[test]
    fn test_window_single_bound_at_calendar_edges() {
        let late = CalendarQuery {
            from: Some(DateTime::<Utc>::MAX_UTC - Duration::days(1)),
            to: None,
        };
        assert!(matches!(
            calendar_window(&late, now()),
            Err(ApiError::BadRequest(_))
        ));

        let early = CalendarQuery {
            from: None,
            to: Some(DateTime::<Utc>::MIN_UTC + Duration::days(1)),
        };
        assert!(matches!(
            calendar_window(&early, now()),
            Err(ApiError::BadRequest(_))
        ));

        let edge = CalendarQuery {
            from: Some(DateTime::<Utc>::MAX_UTC - Duration::days(7)),
            to: None,
        };
        let (_, to) = calendar_window(&edge, now()).unwrap();
        assert_eq!(to, DateTime::<Utc>::MAX_UTC);
    }
}
