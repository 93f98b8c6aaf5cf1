//! Recurrence expansion for shifts and study sessions.
//!
//! A [`RecurrenceDefinition`] describes one event (its first start/end pair)
//! plus an optional cadence. [`expand`] materializes it into concrete
//! [`Occurrence`]s and [`next_occurrence`] finds the first one after a given
//! instant. Nothing in this module reads the system clock: callers pass "now"
//! explicitly.
//!
//! Monthly stepping is anchored to the series start and clamps to the last day
//! of shorter months, so a series starting on Jan 31 continues Feb 29 (or 28),
//! Mar 31, Apr 30 and so on.

use chrono::{DateTime, Datelike, Days, Duration, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Cap used by [`expand_default`] and by forms that preview a series.
pub const DEFAULT_MAX_INSTANCES: usize = 52;

/// Horizon applied to recurring series without an explicit end date.
pub const DEFAULT_HORIZON_DAYS: i64 = 365;

/// Number of series indices [`next_occurrence`] looks at before giving up.
pub const NEXT_OCCURRENCE_SEARCH_LIMIT: u32 = 365;

/// Stepping rule between two consecutive occurrences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrencePattern {
    Daily,
    Weekly,
    Monthly,
}

impl RecurrencePattern {
    pub const ALL: [RecurrencePattern; 3] = [
        RecurrencePattern::Daily,
        RecurrencePattern::Weekly,
        RecurrencePattern::Monthly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecurrencePattern::Daily => "daily",
            RecurrencePattern::Weekly => "weekly",
            RecurrencePattern::Monthly => "monthly",
        }
    }

    /// Human readable label shown next to a series.
    pub fn label(&self) -> &'static str {
        match self {
            RecurrencePattern::Daily => "Every Day",
            RecurrencePattern::Weekly => "Every Week",
            RecurrencePattern::Monthly => "Every Month",
        }
    }

    /// Parse a stored pattern, treating anything unrecognized as "no pattern".
    pub fn parse_lenient(raw: Option<&str>) -> Option<Self> {
        let raw = raw?;
        match raw.parse() {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                tracing::debug!("Ignoring recurrence pattern: {}", e);
                None
            }
        }
    }
}

impl fmt::Display for RecurrencePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown recurrence pattern: {0:?}")]
pub struct UnknownPattern(pub String);

impl FromStr for RecurrencePattern {
    type Err = UnknownPattern;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(RecurrencePattern::Daily),
            "weekly" => Ok(RecurrencePattern::Weekly),
            "monthly" => Ok(RecurrencePattern::Monthly),
            _ => Err(UnknownPattern(s.to_string())),
        }
    }
}

/// Display label for an optional pattern.
pub fn format_pattern(pattern: Option<RecurrencePattern>) -> &'static str {
    match pattern {
        Some(p) => p.label(),
        None => "No recurrence",
    }
}

/// One concrete, dated instance of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Occurrence {
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,
}

impl Occurrence {
    fn starting_at(start: DateTime<Utc>, duration: Duration) -> Option<Self> {
        Some(Occurrence {
            start_datetime: start,
            end_datetime: start.checked_add_signed(duration)?,
        })
    }

    pub fn duration(&self) -> Duration {
        self.end_datetime - self.start_datetime
    }

    /// Whether this occurrence intersects the half-open window `[from, to)`.
    ///
    /// Zero-length occurrences count when their start lies inside the window.
    pub fn overlaps(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
        self.start_datetime < to && (self.end_datetime > from || self.start_datetime >= from)
    }
}

/// Template an event series is expanded from.
///
/// `end_datetime > start_datetime` is expected but not checked here; request
/// validation happens at the API boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceDefinition {
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,
    pub is_recurring: bool,
    #[serde(default)]
    pub recurrence_pattern: Option<RecurrencePattern>,
    /// Last day (inclusive) on which an occurrence may start.
    #[serde(default)]
    pub recurrence_end_date: Option<NaiveDate>,
}

impl RecurrenceDefinition {
    pub fn single(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        RecurrenceDefinition {
            start_datetime: start,
            end_datetime: end,
            is_recurring: false,
            recurrence_pattern: None,
            recurrence_end_date: None,
        }
    }

    pub fn recurring(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        pattern: RecurrencePattern,
        end_date: Option<NaiveDate>,
    ) -> Self {
        RecurrenceDefinition {
            start_datetime: start,
            end_datetime: end,
            is_recurring: true,
            recurrence_pattern: Some(pattern),
            recurrence_end_date: end_date,
        }
    }

    pub fn duration(&self) -> Duration {
        self.end_datetime - self.start_datetime
    }

    /// The definition's own start/end pair.
    pub fn first_occurrence(&self) -> Occurrence {
        Occurrence {
            start_datetime: self.start_datetime,
            end_datetime: self.end_datetime,
        }
    }

    /// The pattern that drives stepping, if this definition actually repeats.
    pub fn cadence(&self) -> Option<RecurrencePattern> {
        if self.is_recurring {
            self.recurrence_pattern
        } else {
            None
        }
    }

    /// Latest instant an occurrence may start at.
    pub fn effective_end(&self) -> DateTime<Utc> {
        match self.recurrence_end_date {
            Some(date) => end_of_day(date),
            None => self
                .start_datetime
                .checked_add_signed(Duration::days(DEFAULT_HORIZON_DAYS))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    fn nth_start(&self, pattern: RecurrencePattern, index: u32) -> Option<DateTime<Utc>> {
        let start = self.start_datetime;
        match pattern {
            RecurrencePattern::Daily => start.checked_add_days(Days::new(u64::from(index))),
            RecurrencePattern::Weekly => start.checked_add_days(Days::new(7 * u64::from(index))),
            RecurrencePattern::Monthly => start.checked_add_months(Months::new(index)),
        }
    }

    /// Index of the first series element starting strictly after `instant`.
    fn first_index_after(&self, pattern: RecurrencePattern, instant: DateTime<Utc>) -> Option<u32> {
        if self.start_datetime > instant {
            return Some(0);
        }

        // Lower bound on the answer; never past it.
        let estimate = match pattern {
            RecurrencePattern::Daily | RecurrencePattern::Weekly => {
                let step = match pattern {
                    RecurrencePattern::Daily => Duration::days(1),
                    _ => Duration::weeks(1),
                };
                instant.signed_duration_since(self.start_datetime).num_seconds() / step.num_seconds()
            }
            RecurrencePattern::Monthly => {
                let months = (i64::from(instant.year()) - i64::from(self.start_datetime.year()))
                    * 12
                    + i64::from(instant.month())
                    - i64::from(self.start_datetime.month());
                months - 1
            }
        };

        let mut index = u32::try_from(estimate.max(0)).ok()?;
        loop {
            if self.nth_start(pattern, index)? > instant {
                return Some(index);
            }
            index = index.checked_add(1)?;
        }
    }
}

fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_nano_opt(23, 59, 59, 999_999_999)
        .map(|last| last.and_utc())
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Expand a definition into its ordered occurrences.
///
/// Non-recurring definitions (or recurring ones without a pattern) produce
/// exactly their own occurrence and ignore `max_instances`. Recurring ones
/// produce at most `max_instances` occurrences, none starting after
/// [`RecurrenceDefinition::effective_end`].
pub fn expand(definition: &RecurrenceDefinition, max_instances: usize) -> Vec<Occurrence> {
    let Some(pattern) = definition.cadence() else {
        return vec![definition.first_occurrence()];
    };

    let horizon = definition.effective_end();
    let duration = definition.duration();
    let mut occurrences = Vec::with_capacity(max_instances.min(DEFAULT_MAX_INSTANCES));

    for index in 0..=u32::MAX {
        if occurrences.len() >= max_instances {
            break;
        }
        let Some(start) = definition.nth_start(pattern, index) else {
            break;
        };
        if start > horizon {
            break;
        }
        match Occurrence::starting_at(start, duration) {
            Some(occurrence) => occurrences.push(occurrence),
            None => break,
        }
    }

    occurrences
}

pub fn expand_default(definition: &RecurrenceDefinition) -> Vec<Occurrence> {
    expand(definition, DEFAULT_MAX_INSTANCES)
}

/// First occurrence starting strictly after `now`.
///
/// Recurring series are searched over their first
/// [`NEXT_OCCURRENCE_SEARCH_LIMIT`] elements within the effective horizon;
/// the index is computed directly rather than by expanding the series.
pub fn next_occurrence(definition: &RecurrenceDefinition, now: DateTime<Utc>) -> Option<Occurrence> {
    let Some(pattern) = definition.cadence() else {
        let only = definition.first_occurrence();
        return (only.start_datetime > now).then_some(only);
    };

    let index = definition.first_index_after(pattern, now)?;
    if index >= NEXT_OCCURRENCE_SEARCH_LIMIT {
        return None;
    }

    let start = definition.nth_start(pattern, index)?;
    if start > definition.effective_end() {
        return None;
    }
    Occurrence::starting_at(start, definition.duration())
}

/// Whether a recurring series is still ongoing at `now`.
///
/// Series without an end date are always active, even though [`expand`]
/// bounds them to a year.
pub fn is_currently_active(definition: &RecurrenceDefinition, now: DateTime<Utc>) -> bool {
    if !definition.is_recurring {
        return false;
    }
    match definition.recurrence_end_date {
        Some(end) => now <= end_of_day(end),
        None => true,
    }
}

/// Occurrences of the series that intersect `[from, to)`, at most `max_instances`.
///
/// Unlike [`expand`] this does not count occurrences before the window
/// against the cap, so a long-running series still shows up in a late window.
pub fn occurrences_between(
    definition: &RecurrenceDefinition,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    max_instances: usize,
) -> Vec<Occurrence> {
    let Some(pattern) = definition.cadence() else {
        let only = definition.first_occurrence();
        return if only.overlaps(from, to) && max_instances > 0 {
            vec![only]
        } else {
            Vec::new()
        };
    };

    let duration = definition.duration();
    let lookback = duration.max(Duration::zero()) + Duration::nanoseconds(1);
    let Some(threshold) = from.checked_sub_signed(lookback) else {
        return Vec::new();
    };
    let Some(first) = definition.first_index_after(pattern, threshold) else {
        return Vec::new();
    };

    let horizon = definition.effective_end();
    let mut occurrences = Vec::new();
    for index in first..=u32::MAX {
        if occurrences.len() >= max_instances {
            break;
        }
        let Some(start) = definition.nth_start(pattern, index) else {
            break;
        };
        if start > horizon || start >= to {
            break;
        }
        let Some(occurrence) = Occurrence::starting_at(start, duration) else {
            break;
        };
        if occurrence.overlaps(from, to) {
            occurrences.push(occurrence);
        }
    }

    occurrences
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn january_series(pattern: RecurrencePattern) -> RecurrenceDefinition {
        RecurrenceDefinition::recurring(
            at(2024, 1, 1, 10, 0),
            at(2024, 1, 1, 11, 0),
            pattern,
            Some(date(2024, 1, 22)),
        )
    }

    #[test]
    fn test_weekly_until_end_date() {
        let occurrences = expand(&january_series(RecurrencePattern::Weekly), 52);

        let starts: Vec<_> = occurrences.iter().map(|o| o.start_datetime).collect();
        assert_eq!(
            starts,
            vec![
                at(2024, 1, 1, 10, 0),
                at(2024, 1, 8, 10, 0),
                at(2024, 1, 15, 10, 0),
                at(2024, 1, 22, 10, 0),
            ]
        );
        for occurrence in &occurrences {
            assert_eq!(occurrence.duration(), Duration::hours(1));
        }
    }

    #[test]
    fn test_daily_until_end_date() {
        let occurrences = expand(&january_series(RecurrencePattern::Daily), 52);

        assert_eq!(occurrences.len(), 22);
        for (i, occurrence) in occurrences.iter().enumerate() {
            let day = 1 + i as u32;
            assert_eq!(occurrence.start_datetime, at(2024, 1, day, 10, 0));
            assert_eq!(occurrence.end_datetime, at(2024, 1, day, 11, 0));
        }
    }

    #[test]
    fn test_monthly_from_month_end_clamps() {
        let definition = RecurrenceDefinition::recurring(
            at(2024, 1, 31, 18, 0),
            at(2024, 1, 31, 22, 0),
            RecurrencePattern::Monthly,
            None,
        );
        let occurrences = expand(&definition, DEFAULT_MAX_INSTANCES);

        assert!(occurrences.len() <= DEFAULT_MAX_INSTANCES);
        assert!(occurrences
            .windows(2)
            .all(|w| w[1].start_datetime > w[0].start_datetime));
        assert!(occurrences
            .iter()
            .all(|o| o.start_datetime <= definition.start_datetime + Duration::days(365)));

        // 2024-01-31 + 365 days = 2025-01-30, so January 2025 is excluded.
        assert_eq!(occurrences.len(), 12);
        assert_eq!(occurrences[1].start_datetime, at(2024, 2, 29, 18, 0));
        assert_eq!(occurrences[2].start_datetime, at(2024, 3, 31, 18, 0));
        assert_eq!(occurrences[3].start_datetime, at(2024, 4, 30, 18, 0));
        assert_eq!(occurrences[3].duration(), Duration::hours(4));
    }

    #[test]
    fn test_non_recurring_ignores_cap() {
        let definition = RecurrenceDefinition::single(at(2024, 5, 1, 9, 0), at(2024, 5, 1, 17, 0));

        for cap in [0, 1, 52, 1000] {
            let occurrences = expand(&definition, cap);
            assert_eq!(occurrences, vec![definition.first_occurrence()]);
        }
    }

    #[test]
    fn test_recurring_without_pattern_degrades_to_single() {
        let mut definition = january_series(RecurrencePattern::Daily);
        definition.recurrence_pattern = None;

        assert_eq!(expand(&definition, 52).len(), 1);
    }

    #[test]
    fn test_pattern_ignored_when_not_recurring() {
        let mut definition = january_series(RecurrencePattern::Daily);
        definition.is_recurring = false;

        assert_eq!(expand(&definition, 52), vec![definition.first_occurrence()]);
    }

    #[test]
    fn test_cap_limits_open_ended_daily() {
        let definition = RecurrenceDefinition::recurring(
            at(2024, 1, 1, 8, 0),
            at(2024, 1, 1, 9, 0),
            RecurrencePattern::Daily,
            None,
        );

        assert_eq!(expand_default(&definition).len(), DEFAULT_MAX_INSTANCES);
        assert_eq!(expand(&definition, 3).len(), 3);
        assert!(expand(&definition, 0).is_empty());
        // The default horizon is inclusive: start + 0..=365 days.
        assert_eq!(expand(&definition, 10_000).len(), 366);
    }

    #[test]
    fn test_end_date_before_start_yields_nothing() {
        let definition = RecurrenceDefinition::recurring(
            at(2024, 3, 10, 8, 0),
            at(2024, 3, 10, 9, 0),
            RecurrencePattern::Weekly,
            Some(date(2024, 3, 1)),
        );

        assert!(expand(&definition, 52).is_empty());
    }

    #[test]
    fn test_next_occurrence_past_single_is_none() {
        let definition = RecurrenceDefinition::single(at(2024, 1, 1, 9, 0), at(2024, 1, 1, 10, 0));

        assert_eq!(next_occurrence(&definition, at(2024, 6, 1, 0, 0)), None);
        assert_eq!(next_occurrence(&definition, at(2024, 1, 1, 9, 0)), None);
    }

    #[test]
    fn test_next_occurrence_future_single() {
        let definition = RecurrenceDefinition::single(at(2024, 1, 1, 9, 0), at(2024, 1, 1, 10, 0));

        assert_eq!(
            next_occurrence(&definition, at(2023, 12, 31, 0, 0)),
            Some(definition.first_occurrence())
        );
    }

    #[test]
    fn test_next_occurrence_weekly() {
        let definition = january_series(RecurrencePattern::Weekly);

        let next = next_occurrence(&definition, at(2024, 1, 9, 0, 0)).unwrap();
        assert_eq!(next.start_datetime, at(2024, 1, 15, 10, 0));
        assert_eq!(next.end_datetime, at(2024, 1, 15, 11, 0));

        // Strictly after: an occurrence starting exactly at now is skipped.
        let next = next_occurrence(&definition, at(2024, 1, 8, 10, 0)).unwrap();
        assert_eq!(next.start_datetime, at(2024, 1, 15, 10, 0));
    }

    #[test]
    fn test_next_occurrence_after_series_ends() {
        let definition = january_series(RecurrencePattern::Daily);

        assert_eq!(next_occurrence(&definition, at(2024, 1, 22, 10, 0)), None);
        assert_eq!(next_occurrence(&definition, at(2025, 1, 1, 0, 0)), None);
    }

    #[test]
    fn test_next_occurrence_monthly_clamped() {
        let definition = RecurrenceDefinition::recurring(
            at(2024, 1, 31, 18, 0),
            at(2024, 1, 31, 19, 0),
            RecurrencePattern::Monthly,
            None,
        );

        let next = next_occurrence(&definition, at(2024, 2, 10, 0, 0)).unwrap();
        assert_eq!(next.start_datetime, at(2024, 2, 29, 18, 0));

        let next = next_occurrence(&definition, at(2024, 3, 1, 0, 0)).unwrap();
        assert_eq!(next.start_datetime, at(2024, 3, 31, 18, 0));
    }

    #[test]
    fn test_next_occurrence_respects_search_limit() {
        // 366 daily elements exist, but only the first 365 are searched.
        let definition = RecurrenceDefinition::recurring(
            at(2024, 1, 1, 8, 0),
            at(2024, 1, 1, 9, 0),
            RecurrencePattern::Daily,
            None,
        );
        let last_searched = definition.start_datetime + Duration::days(364);

        assert_eq!(
            next_occurrence(&definition, last_searched - Duration::minutes(1))
                .map(|o| o.start_datetime),
            Some(last_searched)
        );
        assert_eq!(next_occurrence(&definition, last_searched), None);
    }

    #[test]
    fn test_is_currently_active() {
        let now = at(2024, 1, 22, 23, 30);

        assert!(is_currently_active(&january_series(RecurrencePattern::Weekly), now));
        assert!(!is_currently_active(
            &january_series(RecurrencePattern::Weekly),
            at(2024, 1, 23, 0, 0)
        ));

        let open_ended = RecurrenceDefinition::recurring(
            at(2020, 1, 1, 8, 0),
            at(2020, 1, 1, 9, 0),
            RecurrencePattern::Daily,
            None,
        );
        assert!(is_currently_active(&open_ended, at(2030, 1, 1, 0, 0)));

        let single = RecurrenceDefinition::single(at(2030, 1, 1, 8, 0), at(2030, 1, 1, 9, 0));
        assert!(!is_currently_active(&single, now));
    }

    #[test]
    fn test_format_pattern() {
        assert_eq!(format_pattern(Some(RecurrencePattern::Daily)), "Every Day");
        assert_eq!(format_pattern(Some(RecurrencePattern::Weekly)), "Every Week");
        assert_eq!(format_pattern(Some(RecurrencePattern::Monthly)), "Every Month");
        assert_eq!(format_pattern(None), "No recurrence");
    }

    #[test]
    fn test_pattern_parsing() {
        assert_eq!(" Weekly ".parse::<RecurrencePattern>(), Ok(RecurrencePattern::Weekly));
        assert_eq!(
            "fortnightly".parse::<RecurrencePattern>(),
            Err(UnknownPattern("fortnightly".to_string()))
        );
        assert_eq!(RecurrencePattern::parse_lenient(Some("yearly")), None);
        assert_eq!(
            RecurrencePattern::parse_lenient(Some("monthly")),
            Some(RecurrencePattern::Monthly)
        );

        let json = serde_json::to_string(&RecurrencePattern::Daily).unwrap();
        assert_eq!(json, "\"daily\"");
    }

    #[test]
    fn test_occurrences_between_window() {
        let definition = RecurrenceDefinition::recurring(
            at(2024, 1, 1, 22, 0),
            at(2024, 1, 2, 2, 0),
            RecurrencePattern::Daily,
            None,
        );

        // A window deep into the series, well past the first 52 elements.
        let window = occurrences_between(&definition, at(2024, 6, 1, 0, 0), at(2024, 6, 3, 0, 0), 52);
        let starts: Vec<_> = window.iter().map(|o| o.start_datetime).collect();
        assert_eq!(
            starts,
            vec![
                at(2024, 5, 31, 22, 0),
                at(2024, 6, 1, 22, 0),
                at(2024, 6, 2, 22, 0),
            ]
        );
    }

    #[test]
    fn test_occurrences_between_single() {
        let definition = RecurrenceDefinition::single(at(2024, 1, 1, 9, 0), at(2024, 1, 1, 10, 0));

        assert_eq!(
            occurrences_between(&definition, at(2024, 1, 1, 0, 0), at(2024, 1, 2, 0, 0), 10).len(),
            1
        );
        assert!(
            occurrences_between(&definition, at(2024, 1, 1, 10, 0), at(2024, 1, 2, 0, 0), 10)
                .is_empty()
        );
    }
}
