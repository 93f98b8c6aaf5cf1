use std::borrow::Cow;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::recurrence::{Occurrence, RecurrenceDefinition, RecurrencePattern};
use crate::{CalendarEntry, Shift, StudySession, Workplace};

/// Upper bound accepted for `max_instances` in API requests.
pub const MAX_INSTANCES_LIMIT: usize = 366;

// ============================================================================
// Validation helpers
// ============================================================================

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

/// Accepts `#rrggbb` colors only.
pub fn validate_hex_color(color: &str) -> Result<(), ValidationError> {
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());
    if valid {
        Ok(())
    } else {
        Err(invalid("hex_color", "color must look like #rrggbb"))
    }
}

/// Checks the fields that make up a recurrence template.
///
/// This is the boundary validation the expander itself never performs.
pub fn validate_schedule(definition: &RecurrenceDefinition) -> Result<(), ValidationError> {
    if definition.end_datetime <= definition.start_datetime {
        return Err(invalid(
            "end_before_start",
            "end_datetime must be after start_datetime",
        ));
    }
    if definition.is_recurring && definition.recurrence_pattern.is_none() {
        return Err(invalid(
            "missing_pattern",
            "recurring entries need a recurrence_pattern",
        ));
    }
    if let Some(end_date) = definition.recurrence_end_date {
        if end_date < definition.start_datetime.date_naive() {
            return Err(invalid(
                "end_date_before_start",
                "recurrence_end_date must not be before the first occurrence",
            ));
        }
    }
    Ok(())
}

// ============================================================================
// Auth API Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,

    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    /// Bearer token for non-browser clients; browsers use the cookie.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

// ============================================================================
// Workplace API Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateWorkplaceRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,

    #[validate(range(min = 0, max = 1000000))]
    pub hourly_rate_cents: Option<i32>,

    #[validate(custom = "validate_hex_color")]
    pub color: Option<String>,

    #[validate(length(max = 500))]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateWorkplaceRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,

    #[validate(range(min = 0, max = 1000000))]
    pub hourly_rate_cents: Option<i32>,

    #[validate(custom = "validate_hex_color")]
    pub color: Option<String>,

    #[validate(length(max = 500))]
    pub address: Option<String>,
}

pub type WorkplaceResponse = Workplace;

// ============================================================================
// Shift API Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_create_shift"))]
pub struct CreateShiftRequest {
    pub workplace_id: Uuid,

    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,

    pub start_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,

    #[serde(default)]
    pub is_recurring: bool,
    pub recurrence_pattern: Option<RecurrencePattern>,
    pub recurrence_end_date: Option<NaiveDate>,

    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

impl CreateShiftRequest {
    pub fn recurrence(&self) -> RecurrenceDefinition {
        RecurrenceDefinition {
            start_datetime: self.start_datetime,
            end_datetime: self.end_datetime,
            is_recurring: self.is_recurring,
            recurrence_pattern: self.recurrence_pattern,
            recurrence_end_date: self.recurrence_end_date,
        }
    }
}

fn validate_create_shift(request: &CreateShiftRequest) -> Result<(), ValidationError> {
    validate_schedule(&request.recurrence())
}

/// Partial update. Schedule consistency is checked after merging with the
/// stored row, since any subset of the fields may be present.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateShiftRequest {
    pub workplace_id: Option<Uuid>,

    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,

    pub start_datetime: Option<DateTime<Utc>>,
    pub end_datetime: Option<DateTime<Utc>>,
    pub is_recurring: Option<bool>,
    pub recurrence_pattern: Option<RecurrencePattern>,
    pub recurrence_end_date: Option<NaiveDate>,
    /// Drops any stored recurrence end date when true.
    #[serde(default)]
    pub clear_recurrence_end_date: bool,

    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

impl UpdateShiftRequest {
    /// The schedule that results from applying this update to `current`.
    pub fn merged_recurrence(&self, current: &Shift) -> RecurrenceDefinition {
        RecurrenceDefinition {
            start_datetime: self.start_datetime.unwrap_or(current.start_datetime),
            end_datetime: self.end_datetime.unwrap_or(current.end_datetime),
            is_recurring: self.is_recurring.unwrap_or(current.is_recurring),
            recurrence_pattern: self.recurrence_pattern.or(current.recurrence_pattern),
            recurrence_end_date: if self.clear_recurrence_end_date {
                None
            } else {
                self.recurrence_end_date.or(current.recurrence_end_date)
            },
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListShiftsQuery {
    pub workplace_id: Option<Uuid>,
}

pub type ShiftResponse = Shift;

// ============================================================================
// Study Session API Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_create_study_session"))]
pub struct CreateStudySessionRequest {
    #[validate(length(min = 1, max = 200))]
    pub subject: String,

    #[validate(length(max = 200))]
    pub location: Option<String>,

    pub start_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,

    #[serde(default)]
    pub is_recurring: bool,
    pub recurrence_pattern: Option<RecurrencePattern>,
    pub recurrence_end_date: Option<NaiveDate>,

    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

impl CreateStudySessionRequest {
    pub fn recurrence(&self) -> RecurrenceDefinition {
        RecurrenceDefinition {
            start_datetime: self.start_datetime,
            end_datetime: self.end_datetime,
            is_recurring: self.is_recurring,
            recurrence_pattern: self.recurrence_pattern,
            recurrence_end_date: self.recurrence_end_date,
        }
    }
}

fn validate_create_study_session(
    request: &CreateStudySessionRequest,
) -> Result<(), ValidationError> {
    validate_schedule(&request.recurrence())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateStudySessionRequest {
    #[validate(length(min = 1, max = 200))]
    pub subject: Option<String>,

    #[validate(length(max = 200))]
    pub location: Option<String>,

    pub start_datetime: Option<DateTime<Utc>>,
    pub end_datetime: Option<DateTime<Utc>>,
    pub is_recurring: Option<bool>,
    pub recurrence_pattern: Option<RecurrencePattern>,
    pub recurrence_end_date: Option<NaiveDate>,
    #[serde(default)]
    pub clear_recurrence_end_date: bool,

    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

impl UpdateStudySessionRequest {
    pub fn merged_recurrence(&self, current: &StudySession) -> RecurrenceDefinition {
        RecurrenceDefinition {
            start_datetime: self.start_datetime.unwrap_or(current.start_datetime),
            end_datetime: self.end_datetime.unwrap_or(current.end_datetime),
            is_recurring: self.is_recurring.unwrap_or(current.is_recurring),
            recurrence_pattern: self.recurrence_pattern.or(current.recurrence_pattern),
            recurrence_end_date: if self.clear_recurrence_end_date {
                None
            } else {
                self.recurrence_end_date.or(current.recurrence_end_date)
            },
        }
    }
}

pub type StudySessionResponse = StudySession;

// ============================================================================
// Occurrence API Types
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct OccurrencesQuery {
    #[validate(range(min = 1, max = 366))]
    pub max_instances: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NextOccurrenceQuery {
    pub now: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccurrencesResponse {
    pub recurrence_label: String,
    pub is_active: bool,
    pub occurrences: Vec<Occurrence>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextOccurrenceResponse {
    pub now: DateTime<Utc>,
    pub occurrence: Option<Occurrence>,
}

/// Expand a template without persisting anything.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_preview"))]
pub struct RecurrencePreviewRequest {
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,

    #[serde(default)]
    pub is_recurring: bool,
    pub recurrence_pattern: Option<RecurrencePattern>,
    pub recurrence_end_date: Option<NaiveDate>,

    #[validate(range(min = 1, max = 366))]
    pub max_instances: Option<usize>,

    pub now: Option<DateTime<Utc>>,
}

impl RecurrencePreviewRequest {
    pub fn recurrence(&self) -> RecurrenceDefinition {
        RecurrenceDefinition {
            start_datetime: self.start_datetime,
            end_datetime: self.end_datetime,
            is_recurring: self.is_recurring,
            recurrence_pattern: self.recurrence_pattern,
            recurrence_end_date: self.recurrence_end_date,
        }
    }
}

fn validate_preview(request: &RecurrencePreviewRequest) -> Result<(), ValidationError> {
    validate_schedule(&request.recurrence())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrencePreviewResponse {
    pub recurrence_label: String,
    pub is_active: bool,
    pub occurrences: Vec<Occurrence>,
    pub next_occurrence: Option<Occurrence>,
}

// ============================================================================
// Calendar & Dashboard API Types
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalendarQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarResponse {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub entries: Vec<CalendarEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkplaceWeekSummary {
    pub workplace_id: Uuid,
    pub name: String,
    pub minutes: i64,
    pub earnings_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub week_start: DateTime<Utc>,
    pub week_end: DateTime<Utc>,
    pub shift_minutes: i64,
    pub study_minutes: i64,
    pub earnings_cents: i64,
    pub workplaces: Vec<WorkplaceWeekSummary>,
    pub next_shift: Option<CalendarEntry>,
    pub next_study_session: Option<CalendarEntry>,
    pub active_series: usize,
}

// ============================================================================
// Misc
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// API error response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()
    }

    fn shift_request() -> CreateShiftRequest {
        CreateShiftRequest {
            workplace_id: Uuid::new_v4(),
            title: Some("Morning".to_string()),
            start_datetime: start(),
            end_datetime: start() + Duration::hours(4),
            is_recurring: true,
            recurrence_pattern: Some(RecurrencePattern::Weekly),
            recurrence_end_date: NaiveDate::from_ymd_opt(2024, 3, 1),
            notes: None,
        }
    }

    #[test]
    fn test_valid_shift_request() {
        assert!(shift_request().validate().is_ok());
    }

    #[test]
    fn test_shift_end_must_follow_start() {
        let mut request = shift_request();
        request.end_datetime = request.start_datetime;

        let errors = request.validate().unwrap_err();
        assert!(errors.errors().contains_key("__all__"));
    }

    #[test]
    fn test_recurring_shift_needs_pattern() {
        let mut request = shift_request();
        request.recurrence_pattern = None;
        assert!(request.validate().is_err());

        request.is_recurring = false;
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_recurrence_end_date_before_start_rejected() {
        let mut request = shift_request();
        request.recurrence_end_date = NaiveDate::from_ymd_opt(2023, 12, 31);
        assert!(request.validate().is_err());

        // Same day as the first occurrence is fine.
        request.recurrence_end_date = NaiveDate::from_ymd_opt(2024, 1, 1);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_workplace_color_validation() {
        let mut request = CreateWorkplaceRequest {
            name: "Library".to_string(),
            hourly_rate_cents: Some(1450),
            color: Some("#1a2B3c".to_string()),
            address: None,
        };
        assert!(request.validate().is_ok());

        request.color = Some("blue".to_string());
        assert!(request.validate().is_err());

        request.color = None;
        request.hourly_rate_cents = Some(-1);
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_register_request_validation() {
        let request = RegisterRequest {
            email: "not-an-email".to_string(),
            password: "short".to_string(),
            name: None,
        };
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
    }

    #[test]
    fn test_update_merges_with_current() {
        let current = Shift {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            workplace_id: Uuid::new_v4(),
            title: None,
            start_datetime: start(),
            end_datetime: start() + Duration::hours(2),
            is_recurring: true,
            recurrence_pattern: Some(RecurrencePattern::Daily),
            recurrence_end_date: NaiveDate::from_ymd_opt(2024, 2, 1),
            notes: None,
            created_at: start(),
            updated_at: start(),
        };
        let update = UpdateShiftRequest {
            end_datetime: Some(start() + Duration::hours(3)),
            clear_recurrence_end_date: true,
            ..Default::default()
        };

        let merged = update.merged_recurrence(&current);
        assert_eq!(merged.duration(), Duration::hours(3));
        assert_eq!(merged.recurrence_pattern, Some(RecurrencePattern::Daily));
        assert_eq!(merged.recurrence_end_date, None);
        assert!(validate_schedule(&merged).is_ok());
    }

    #[test]
    fn test_preview_request_defaults() {
        let json = r#"{
            "start_datetime": "2024-01-01T10:00:00Z",
            "end_datetime": "2024-01-01T11:00:00Z"
        }"#;
        let request: RecurrencePreviewRequest = serde_json::from_str(json).unwrap();

        assert!(!request.is_recurring);
        assert_eq!(request.max_instances, None);
        assert!(request.validate().is_ok());
    }
}
