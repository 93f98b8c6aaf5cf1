use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, SecondsFormat, Utc};
use shared_types::{CalendarEntry, CalendarEntryKind, CalendarResponse};
use yew::prelude::*;

use crate::services::api;
use crate::session::use_failure_handler;

/// Monday 00:00 UTC of the week containing `today`, shifted by whole weeks.
fn week_start(today: NaiveDate, offset_weeks: i64) -> DateTime<Utc> {
    let monday = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
    (monday + Duration::weeks(offset_weeks))
        .and_time(NaiveTime::default())
        .and_utc()
}

/// Entries bucketed by the UTC day they start on, in order.
fn group_by_day(entries: &[CalendarEntry]) -> Vec<(NaiveDate, Vec<CalendarEntry>)> {
    let mut days: Vec<(NaiveDate, Vec<CalendarEntry>)> = Vec::new();
    for entry in entries {
        let day = entry.start_datetime.date_naive();
        match days.last_mut() {
            Some((last, bucket)) if *last == day => bucket.push(entry.clone()),
            _ => days.push((day, vec![entry.clone()])),
        }
    }
    days
}

fn calendar_url(from: DateTime<Utc>, to: DateTime<Utc>) -> String {
    format!(
        "/api/calendar?from={}&to={}",
        from.to_rfc3339_opts(SecondsFormat::Secs, true),
        to.to_rfc3339_opts(SecondsFormat::Secs, true)
    )
}

fn entry_view(entry: &CalendarEntry) -> Html {
    let kind_class = match entry.kind {
        CalendarEntryKind::Shift => "entry entry-shift",
        CalendarEntryKind::Study => "entry entry-study",
    };
    let style = entry
        .color
        .as_deref()
        .map(|color| format!("border-left-color: {}", color))
        .unwrap_or_default();

    html! {
        <li class={kind_class} style={style}>
            <span class="entry-time">
                {format!(
                    "{} - {}",
                    entry.start_datetime.format("%H:%M"),
                    entry.end_datetime.format("%H:%M")
                )}
            </span>
            <span class="entry-title">{&entry.title}</span>
            <span class="entry-kind">{entry.kind.as_str()}</span>
            <span class="entry-recurrence">{&entry.recurrence_label}</span>
        </li>
    }
}

#[function_component(CalendarView)]
pub fn calendar_view() -> Html {
    let offset = use_state(|| 0i64);
    let calendar = use_state(|| None::<CalendarResponse>);
    let error = use_state(|| None::<String>);
    let on_failure = use_failure_handler(error.clone());

    {
        let calendar = calendar.clone();
        let error = error.clone();
        use_effect_with(*offset, move |offset| {
            let from = week_start(Utc::now().date_naive(), *offset);
            let url = calendar_url(from, from + Duration::weeks(1));
            wasm_bindgen_futures::spawn_local(async move {
                match api::get::<CalendarResponse>(&url).await {
                    Ok(data) => {
                        error.set(None);
                        calendar.set(Some(data));
                    }
                    Err(failure) => on_failure.emit(failure),
                }
            });
            || ()
        });
    }

    let step = |delta: i64| {
        let offset = offset.clone();
        Callback::from(move |_: MouseEvent| offset.set(*offset + delta))
    };
    let this_week = {
        let offset = offset.clone();
        Callback::from(move |_| offset.set(0))
    };

    let body = match (&*error, &*calendar) {
        (Some(err), _) => html! { <p class="error">{err}</p> },
        (None, None) => html! { <p class="loading">{"Loading calendar..."}</p> },
        (None, Some(calendar)) if calendar.entries.is_empty() => {
            html! { <p class="empty-state">{"Nothing scheduled this week."}</p> }
        }
        (None, Some(calendar)) => group_by_day(&calendar.entries)
            .into_iter()
            .map(|(day, entries)| {
                html! {
                    <section class="calendar-day" key={day.to_string()}>
                        <h3>{day.format("%A %b %d").to_string()}</h3>
                        <ul>{ for entries.iter().map(entry_view) }</ul>
                    </section>
                }
            })
            .collect::<Html>(),
    };

    let heading = match &*calendar {
        Some(calendar) => format!("Week of {}", calendar.from.format("%Y-%m-%d")),
        None => "Calendar".to_string(),
    };

    html! {
        <div class="calendar-container">
            <h2>{heading}</h2>
            <div class="calendar-nav">
                <button onclick={step(-1)}>{"← Previous"}</button>
                <button onclick={this_week}>{"This week"}</button>
                <button onclick={step(1)}>{"Next →"}</button>
            </div>
            {body}
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn entry(kind: CalendarEntryKind, title: &str, start: DateTime<Utc>) -> CalendarEntry {
        CalendarEntry {
            kind,
            source_id: Uuid::new_v4(),
            title: title.to_string(),
            color: None,
            start_datetime: start,
            end_datetime: start + Duration::hours(2),
            recurrence_label: "One-time".to_string(),
        }
    }

    #[test]
    fn test_week_start() {
        // Wednesday
        let today = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        assert_eq!(
            week_start(today, 0),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            week_start(today, -1),
            Utc.with_ymd_and_hms(2023, 12, 25, 0, 0, 0).unwrap()
        );

        let monday = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
        assert_eq!(
            week_start(monday, 0),
            Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_group_by_day() {
        let entries = vec![
            entry(
                CalendarEntryKind::Study,
                "Algebra",
                Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
            ),
            entry(
                CalendarEntryKind::Shift,
                "Cafe",
                Utc.with_ymd_and_hms(2024, 1, 1, 14, 0, 0).unwrap(),
            ),
            entry(
                CalendarEntryKind::Shift,
                "Cafe",
                Utc.with_ymd_and_hms(2024, 1, 3, 14, 0, 0).unwrap(),
            ),
        ];

        let days = group_by_day(&entries);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].0, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(days[0].1.len(), 2);
        assert_eq!(days[0].1[0].title, "Algebra");
        assert_eq!(days[1].0, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
        assert!(group_by_day(&[]).is_empty());
    }

    #[test]
    fn test_calendar_url() {
        let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            calendar_url(from, from + Duration::weeks(1)),
            "/api/calendar?from=2024-01-01T00:00:00Z&to=2024-01-08T00:00:00Z"
        );
    }
}
