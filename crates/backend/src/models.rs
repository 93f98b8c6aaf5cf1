// Database models for Diesel
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use shared_types::{
    CreateShiftRequest, CreateStudySessionRequest, CreateWorkplaceRequest, RecurrencePattern,
    Shift, StudySession, UpdateShiftRequest, UpdateStudySessionRequest, UpdateWorkplaceRequest,
    User,
};
use uuid::Uuid;

/// Database representation of users, including the password hash
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email,
            name: row.name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::users)]
pub struct NewUser<'a> {
    pub email: &'a str,
    pub name: Option<&'a str>,
    pub password_hash: &'a str,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::workplaces)]
pub struct NewWorkplace {
    pub user_id: Uuid,
    pub name: String,
    pub hourly_rate_cents: Option<i32>,
    pub color: Option<String>,
    pub address: Option<String>,
}

impl NewWorkplace {
    pub fn from_request(user_id: Uuid, request: CreateWorkplaceRequest) -> Self {
        NewWorkplace {
            user_id,
            name: request.name,
            hourly_rate_cents: request.hourly_rate_cents,
            color: request.color,
            address: request.address,
        }
    }
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = crate::schema::workplaces)]
pub struct WorkplaceChanges {
    pub name: Option<String>,
    pub hourly_rate_cents: Option<Option<i32>>,
    pub color: Option<Option<String>>,
    pub address: Option<Option<String>>,
    pub updated_at: DateTime<Utc>,
}

impl From<UpdateWorkplaceRequest> for WorkplaceChanges {
    fn from(request: UpdateWorkplaceRequest) -> Self {
        WorkplaceChanges {
            name: request.name,
            hourly_rate_cents: request.hourly_rate_cents.map(Some),
            color: request.color.map(Some),
            address: request.address.map(Some),
            updated_at: Utc::now(),
        }
    }
}

/// Database representation of shifts.
/// The recurrence pattern is stored as free text and parsed leniently on read.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crate::schema::shifts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ShiftRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub workplace_id: Uuid,
    pub title: Option<String>,
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,
    pub is_recurring: bool,
    pub recurrence_pattern: Option<String>,
    pub recurrence_end_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ShiftRow> for Shift {
    fn from(row: ShiftRow) -> Self {
        Shift {
            id: row.id,
            user_id: row.user_id,
            workplace_id: row.workplace_id,
            title: row.title,
            start_datetime: row.start_datetime,
            end_datetime: row.end_datetime,
            is_recurring: row.is_recurring,
            recurrence_pattern: RecurrencePattern::parse_lenient(row.recurrence_pattern.as_deref()),
            recurrence_end_date: row.recurrence_end_date,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn pattern_column(pattern: Option<RecurrencePattern>) -> Option<String> {
    pattern.map(|p| p.as_str().to_string())
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::shifts)]
pub struct NewShift {
    pub user_id: Uuid,
    pub workplace_id: Uuid,
    pub title: Option<String>,
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,
    pub is_recurring: bool,
    pub recurrence_pattern: Option<String>,
    pub recurrence_end_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl NewShift {
    pub fn from_request(user_id: Uuid, request: CreateShiftRequest) -> Self {
        NewShift {
            user_id,
            workplace_id: request.workplace_id,
            title: request.title,
            start_datetime: request.start_datetime,
            end_datetime: request.end_datetime,
            is_recurring: request.is_recurring,
            recurrence_pattern: pattern_column(request.recurrence_pattern),
            recurrence_end_date: request.recurrence_end_date,
            notes: request.notes,
        }
    }
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = crate::schema::shifts)]
pub struct ShiftChanges {
    pub workplace_id: Option<Uuid>,
    pub title: Option<Option<String>>,
    pub start_datetime: Option<DateTime<Utc>>,
    pub end_datetime: Option<DateTime<Utc>>,
    pub is_recurring: Option<bool>,
    pub recurrence_pattern: Option<Option<String>>,
    pub recurrence_end_date: Option<Option<NaiveDate>>,
    pub notes: Option<Option<String>>,
    pub updated_at: DateTime<Utc>,
}

impl From<UpdateShiftRequest> for ShiftChanges {
    fn from(request: UpdateShiftRequest) -> Self {
        ShiftChanges {
            workplace_id: request.workplace_id,
            title: request.title.map(Some),
            start_datetime: request.start_datetime,
            end_datetime: request.end_datetime,
            is_recurring: request.is_recurring,
            recurrence_pattern: request
                .recurrence_pattern
                .map(|p| pattern_column(Some(p))),
            recurrence_end_date: if request.clear_recurrence_end_date {
                Some(None)
            } else {
                request.recurrence_end_date.map(Some)
            },
            notes: request.notes.map(Some),
            updated_at: Utc::now(),
        }
    }
}

/// Database representation of study_sessions
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crate::schema::study_sessions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct StudySessionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subject: String,
    pub location: Option<String>,
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,
    pub is_recurring: bool,
    pub recurrence_pattern: Option<String>,
    pub recurrence_end_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<StudySessionRow> for StudySession {
    fn from(row: StudySessionRow) -> Self {
        StudySession {
            id: row.id,
            user_id: row.user_id,
            subject: row.subject,
            location: row.location,
            start_datetime: row.start_datetime,
            end_datetime: row.end_datetime,
            is_recurring: row.is_recurring,
            recurrence_pattern: RecurrencePattern::parse_lenient(row.recurrence_pattern.as_deref()),
            recurrence_end_date: row.recurrence_end_date,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::study_sessions)]
pub struct NewStudySession {
    pub user_id: Uuid,
    pub subject: String,
    pub location: Option<String>,
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,
    pub is_recurring: bool,
    pub recurrence_pattern: Option<String>,
    pub recurrence_end_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl NewStudySession {
    pub fn from_request(user_id: Uuid, request: CreateStudySessionRequest) -> Self {
        NewStudySession {
            user_id,
            subject: request.subject,
            location: request.location,
            start_datetime: request.start_datetime,
            end_datetime: request.end_datetime,
            is_recurring: request.is_recurring,
            recurrence_pattern: pattern_column(request.recurrence_pattern),
            recurrence_end_date: request.recurrence_end_date,
            notes: request.notes,
        }
    }
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = crate::schema::study_sessions)]
pub struct StudySessionChanges {
    pub subject: Option<String>,
    pub location: Option<Option<String>>,
    pub start_datetime: Option<DateTime<Utc>>,
    pub end_datetime: Option<DateTime<Utc>>,
    pub is_recurring: Option<bool>,
    pub recurrence_pattern: Option<Option<String>>,
    pub recurrence_end_date: Option<Option<NaiveDate>>,
    pub notes: Option<Option<String>>,
    pub updated_at: DateTime<Utc>,
}

impl From<UpdateStudySessionRequest> for StudySessionChanges {
    fn from(request: UpdateStudySessionRequest) -> Self {
        StudySessionChanges {
            subject: request.subject,
            location: request.location.map(Some),
            start_datetime: request.start_datetime,
            end_datetime: request.end_datetime,
            is_recurring: request.is_recurring,
            recurrence_pattern: request
                .recurrence_pattern
                .map(|p| pattern_column(Some(p))),
            recurrence_end_date: if request.clear_recurrence_end_date {
                Some(None)
            } else {
                request.recurrence_end_date.map(Some)
            },
            notes: request.notes.map(Some),
            updated_at: Utc::now(),
        }
    }
}
