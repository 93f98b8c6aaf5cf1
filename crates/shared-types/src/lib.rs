use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod api;
pub mod recurrence;

pub use api::*;
pub use recurrence::{
    expand, expand_default, format_pattern, is_currently_active, next_occurrence,
    occurrences_between, Occurrence, RecurrenceDefinition, RecurrencePattern, UnknownPattern,
    DEFAULT_MAX_INSTANCES,
};

/// Anything placed on the calendar through a recurrence template.
pub trait Scheduled {
    fn id(&self) -> Uuid;

    fn recurrence(&self) -> RecurrenceDefinition;
}

/// Registered account. The password hash never leaves the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Workplace struct matching database column order exactly
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "diesel", derive(diesel::Queryable))]
pub struct Workplace {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub hourly_rate_cents: Option<i32>,
    pub color: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Workplace {
    /// Estimated pay for `minutes` worked here, rounded down to the cent.
    pub fn earnings_cents(&self, minutes: i64) -> i64 {
        self.hourly_rate_cents
            .map(|rate| minutes * i64::from(rate) / 60)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    pub id: Uuid,
    pub user_id: Uuid,
    pub workplace_id: Uuid,
    pub title: Option<String>,
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,
    pub is_recurring: bool,
    pub recurrence_pattern: Option<RecurrencePattern>,
    pub recurrence_end_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Scheduled for Shift {
    fn id(&self) -> Uuid {
        self.id
    }

    fn recurrence(&self) -> RecurrenceDefinition {
        RecurrenceDefinition {
            start_datetime: self.start_datetime,
            end_datetime: self.end_datetime,
            is_recurring: self.is_recurring,
            recurrence_pattern: self.recurrence_pattern,
            recurrence_end_date: self.recurrence_end_date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudySession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subject: String,
    pub location: Option<String>,
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,
    pub is_recurring: bool,
    pub recurrence_pattern: Option<RecurrencePattern>,
    pub recurrence_end_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Scheduled for StudySession {
    fn id(&self) -> Uuid {
        self.id
    }

    fn recurrence(&self) -> RecurrenceDefinition {
        RecurrenceDefinition {
            start_datetime: self.start_datetime,
            end_datetime: self.end_datetime,
            is_recurring: self.is_recurring,
            recurrence_pattern: self.recurrence_pattern,
            recurrence_end_date: self.recurrence_end_date,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarEntryKind {
    Shift,
    Study,
}

impl CalendarEntryKind {
    pub fn as_str(&self) -> &str {
        match self {
            CalendarEntryKind::Shift => "shift",
            CalendarEntryKind::Study => "study",
        }
    }
}

/// One occurrence placed on the calendar, with enough context to render it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEntry {
    pub kind: CalendarEntryKind,
    pub source_id: Uuid,
    pub title: String,
    pub color: Option<String>,
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,
    pub recurrence_label: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn workplace(rate: Option<i32>) -> Workplace {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Workplace {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Cafe".to_string(),
            hourly_rate_cents: rate,
            color: None,
            address: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_earnings_rounds_down() {
        assert_eq!(workplace(Some(1500)).earnings_cents(90), 2250);
        assert_eq!(workplace(Some(1001)).earnings_cents(1), 16);
        assert_eq!(workplace(None).earnings_cents(600), 0);
    }

    #[test]
    fn test_shift_recurrence_carries_fields() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let shift = Shift {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            workplace_id: Uuid::new_v4(),
            title: None,
            start_datetime: start,
            end_datetime: start + chrono::Duration::hours(4),
            is_recurring: true,
            recurrence_pattern: Some(RecurrencePattern::Weekly),
            recurrence_end_date: NaiveDate::from_ymd_opt(2024, 1, 22),
            notes: None,
            created_at: start,
            updated_at: start,
        };

        let definition = shift.recurrence();
        assert_eq!(definition.cadence(), Some(RecurrencePattern::Weekly));
        assert_eq!(expand(&definition, 52).len(), 4);
    }
}
