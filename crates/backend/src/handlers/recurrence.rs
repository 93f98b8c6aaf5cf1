use axum::Json;
use chrono::{DateTime, Utc};
use shared_types::{
    api::validate_schedule, expand, format_pattern, is_currently_active, next_occurrence,
    NextOccurrenceResponse, OccurrencesResponse, RecurrenceDefinition, RecurrencePreviewRequest,
    RecurrencePreviewResponse, DEFAULT_MAX_INSTANCES,
};
use validator::ValidationErrors;

use crate::error::ApiResult;

use super::validated;

/// Re-check a schedule after a partial update was merged into the stored row.
pub fn check_schedule(definition: &RecurrenceDefinition) -> ApiResult<()> {
    validate_schedule(definition).map_err(|e| {
        let mut errors = ValidationErrors::new();
        errors.add("__all__", e);
        errors.into()
    })
}

pub fn occurrences_response(
    definition: &RecurrenceDefinition,
    max_instances: Option<usize>,
    now: DateTime<Utc>,
) -> OccurrencesResponse {
    OccurrencesResponse {
        recurrence_label: format_pattern(definition.cadence()).to_string(),
        is_active: is_currently_active(definition, now),
        occurrences: expand(definition, max_instances.unwrap_or(DEFAULT_MAX_INSTANCES)),
    }
}

pub fn next_response(definition: &RecurrenceDefinition, now: DateTime<Utc>) -> NextOccurrenceResponse {
    NextOccurrenceResponse {
        now,
        occurrence: next_occurrence(definition, now),
    }
}

/// Expand an unsaved template, used by the forms' live preview.
pub async fn preview(
    Json(payload): Json<RecurrencePreviewRequest>,
) -> ApiResult<Json<RecurrencePreviewResponse>> {
    let payload = validated(payload)?;
    let definition = payload.recurrence();
    let now = payload.now.unwrap_or_else(Utc::now);

    let listing = occurrences_response(&definition, payload.max_instances, now);
    Ok(Json(RecurrencePreviewResponse {
        recurrence_label: listing.recurrence_label,
        is_active: listing.is_active,
        occurrences: listing.occurrences,
        next_occurrence: next_occurrence(&definition, now),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, TimeZone};
    use shared_types::RecurrencePattern;

    fn weekly() -> RecurrenceDefinition {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        RecurrenceDefinition::recurring(
            start,
            start + Duration::hours(1),
            RecurrencePattern::Weekly,
            NaiveDate::from_ymd_opt(2024, 1, 22),
        )
    }

    #[test]
    fn test_occurrences_response() {
        let now = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        let response = occurrences_response(&weekly(), None, now);

        assert_eq!(response.recurrence_label, "Every Week");
        assert!(response.is_active);
        assert_eq!(response.occurrences.len(), 4);

        let capped = occurrences_response(&weekly(), Some(2), now);
        assert_eq!(capped.occurrences.len(), 2);
    }

    #[test]
    fn test_next_response() {
        let now = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        let response = next_response(&weekly(), now);
        assert_eq!(
            response.occurrence.map(|o| o.start_datetime),
            Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).single()
        );

        let after_end = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        assert!(next_response(&weekly(), after_end).occurrence.is_none());
    }

    #[test]
    fn test_check_schedule_rejects_inverted_times() {
        let mut definition = weekly();
        definition.end_datetime = definition.start_datetime - Duration::minutes(5);
        assert!(check_schedule(&definition).is_err());
        assert!(check_schedule(&weekly()).is_ok());
    }
}
