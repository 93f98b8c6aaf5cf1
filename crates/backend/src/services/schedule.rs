//! Calendar and dashboard aggregation over loaded rows.
//!
//! Everything here is pure; handlers load the user's rows and pass the
//! current time in.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, Timelike, Utc};
use shared_types::{
    format_pattern, is_currently_active, next_occurrence, occurrences_between, CalendarEntry,
    CalendarEntryKind, DashboardSummary, Occurrence, Scheduled, Shift, StudySession, Workplace,
    WorkplaceWeekSummary,
};
use uuid::Uuid;

/// Longest window the calendar endpoint will expand.
pub const MAX_CALENDAR_WINDOW_DAYS: i64 = 366;

/// Per-series bound for a single calendar window.
const MAX_ENTRIES_PER_SERIES: usize = 1000;

/// Monday 00:00 UTC of the ISO week containing `now`, and the following Monday.
pub fn week_bounds(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let days_from_monday = i64::from(now.weekday().num_days_from_monday());
    let since_midnight = Duration::seconds(i64::from(now.num_seconds_from_midnight()))
        + Duration::nanoseconds(i64::from(now.nanosecond()));
    let start = now - since_midnight - Duration::days(days_from_monday);
    (start, start + Duration::days(7))
}

fn shift_title(shift: &Shift, workplace: Option<&Workplace>) -> String {
    shift
        .title
        .clone()
        .or_else(|| workplace.map(|w| w.name.clone()))
        .unwrap_or_else(|| "Shift".to_string())
}

fn shift_entry(shift: &Shift, workplace: Option<&Workplace>, occurrence: Occurrence) -> CalendarEntry {
    CalendarEntry {
        kind: CalendarEntryKind::Shift,
        source_id: shift.id(),
        title: shift_title(shift, workplace),
        color: workplace.and_then(|w| w.color.clone()),
        start_datetime: occurrence.start_datetime,
        end_datetime: occurrence.end_datetime,
        recurrence_label: format_pattern(shift.recurrence().cadence()).to_string(),
    }
}

fn study_entry(session: &StudySession, occurrence: Occurrence) -> CalendarEntry {
    CalendarEntry {
        kind: CalendarEntryKind::Study,
        source_id: session.id(),
        title: session.subject.clone(),
        color: None,
        start_datetime: occurrence.start_datetime,
        end_datetime: occurrence.end_datetime,
        recurrence_label: format_pattern(session.recurrence().cadence()).to_string(),
    }
}

/// Every occurrence of every shift and study session that overlaps `[from, to)`,
/// ordered by start time.
pub fn build_calendar(
    shifts: &[Shift],
    sessions: &[StudySession],
    workplaces: &[Workplace],
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Vec<CalendarEntry> {
    let by_id: HashMap<Uuid, &Workplace> = workplaces.iter().map(|w| (w.id, w)).collect();
    let mut entries = Vec::new();

    for shift in shifts {
        let workplace = by_id.get(&shift.workplace_id).copied();
        entries.extend(
            occurrences_between(&shift.recurrence(), from, to, MAX_ENTRIES_PER_SERIES)
                .into_iter()
                .map(|occurrence| shift_entry(shift, workplace, occurrence)),
        );
    }

    for session in sessions {
        entries.extend(
            occurrences_between(&session.recurrence(), from, to, MAX_ENTRIES_PER_SERIES)
                .into_iter()
                .map(|occurrence| study_entry(session, occurrence)),
        );
    }

    entries.sort_by(|a, b| {
        a.start_datetime
            .cmp(&b.start_datetime)
            .then_with(|| a.end_datetime.cmp(&b.end_datetime))
            .then_with(|| a.title.cmp(&b.title))
    });
    entries
}

/// Minutes of `occurrence` that fall inside `[from, to)`.
fn minutes_within(occurrence: &Occurrence, from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    let start = occurrence.start_datetime.max(from);
    let end = occurrence.end_datetime.min(to);
    if end > start {
        (end - start).num_minutes()
    } else {
        0
    }
}

/// Weekly totals, upcoming items and active series count at `now`.
pub fn dashboard_summary(
    shifts: &[Shift],
    sessions: &[StudySession],
    workplaces: &[Workplace],
    now: DateTime<Utc>,
) -> DashboardSummary {
    let (week_start, week_end) = week_bounds(now);
    let by_id: HashMap<Uuid, &Workplace> = workplaces.iter().map(|w| (w.id, w)).collect();

    let mut minutes_by_workplace: HashMap<Uuid, i64> = HashMap::new();
    for shift in shifts {
        let minutes: i64 =
            occurrences_between(&shift.recurrence(), week_start, week_end, MAX_ENTRIES_PER_SERIES)
                .iter()
                .map(|o| minutes_within(o, week_start, week_end))
                .sum();
        *minutes_by_workplace.entry(shift.workplace_id).or_default() += minutes;
    }

    let study_minutes = sessions
        .iter()
        .flat_map(|s| {
            occurrences_between(&s.recurrence(), week_start, week_end, MAX_ENTRIES_PER_SERIES)
        })
        .map(|o| minutes_within(&o, week_start, week_end))
        .sum();

    let mut workplace_totals: Vec<WorkplaceWeekSummary> = workplaces
        .iter()
        .map(|w| {
            let minutes = minutes_by_workplace.get(&w.id).copied().unwrap_or(0);
            WorkplaceWeekSummary {
                workplace_id: w.id,
                name: w.name.clone(),
                minutes,
                earnings_cents: w.earnings_cents(minutes),
            }
        })
        .collect();
    workplace_totals.sort_by(|a, b| a.name.cmp(&b.name));

    let next_shift = shifts
        .iter()
        .filter_map(|s| next_occurrence(&s.recurrence(), now).map(|o| (s, o)))
        .min_by_key(|(_, o)| o.start_datetime)
        .map(|(s, o)| shift_entry(s, by_id.get(&s.workplace_id).copied(), o));

    let next_study_session = sessions
        .iter()
        .filter_map(|s| next_occurrence(&s.recurrence(), now).map(|o| (s, o)))
        .min_by_key(|(_, o)| o.start_datetime)
        .map(|(s, o)| study_entry(s, o));

    let active_series = shifts
        .iter()
        .map(|s| s.recurrence())
        .chain(sessions.iter().map(|s| s.recurrence()))
        .filter(|d| is_currently_active(d, now))
        .count();

    DashboardSummary {
        week_start,
        week_end,
        shift_minutes: minutes_by_workplace.values().sum(),
        study_minutes,
        earnings_cents: workplace_totals.iter().map(|w| w.earnings_cents).sum(),
        workplaces: workplace_totals,
        next_shift,
        next_study_session,
        active_series,
    }
}
