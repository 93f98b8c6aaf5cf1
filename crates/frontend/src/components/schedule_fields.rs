//! Recurrence form fields shared by the shift and study forms, with a live
//! preview of the generated occurrences.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use shared_types::{
    expand, format_pattern, validate_schedule, Occurrence, RecurrenceDefinition,
    RecurrencePattern, MAX_INSTANCES_LIMIT,
};
use web_sys::{HtmlInputElement, HtmlSelectElement};
use yew::prelude::*;

/// Occurrences listed under the form.
pub const PREVIEW_INSTANCES: usize = 8;

/// Raw form state. Times are entered and stepped in UTC.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleDraft {
    pub start: String,
    pub end: String,
    pub is_recurring: bool,
    pub pattern: RecurrencePattern,
    pub until: String,
}

impl Default for ScheduleDraft {
    fn default() -> Self {
        ScheduleDraft {
            start: String::new(),
            end: String::new(),
            is_recurring: false,
            pattern: RecurrencePattern::Weekly,
            until: String::new(),
        }
    }
}

/// Parse the value of a `datetime-local` input.
pub fn parse_input_datetime(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .map(|naive| naive.and_utc())
}

impl ScheduleDraft {
    /// The template this draft describes, checked the same way the server
    /// checks it.
    pub fn definition(&self) -> Result<RecurrenceDefinition, String> {
        let start = parse_input_datetime(&self.start).ok_or("Start time is required")?;
        let end = parse_input_datetime(&self.end).ok_or("End time is required")?;

        let definition = if self.is_recurring {
            let until = match self.until.trim() {
                "" => None,
                raw => Some(
                    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                        .map_err(|_| "Repeat until must be a date".to_string())?,
                ),
            };
            RecurrenceDefinition::recurring(start, end, self.pattern, until)
        } else {
            RecurrenceDefinition::single(start, end)
        };

        validate_schedule(&definition).map_err(|e| match e.message {
            Some(message) => message.to_string(),
            None => e.code.to_string(),
        })?;
        Ok(definition)
    }
}

pub fn format_occurrence(occurrence: &Occurrence) -> String {
    let start = occurrence.start_datetime;
    let end = occurrence.end_datetime;
    let end_format = if start.date_naive() == end.date_naive() {
        "%H:%M"
    } else {
        "%a %Y-%m-%d %H:%M"
    };
    format!(
        "{} → {}",
        start.format("%a %Y-%m-%d %H:%M"),
        end.format(end_format)
    )
}

#[derive(Properties, PartialEq)]
pub struct ScheduleFieldsProps {
    pub draft: ScheduleDraft,
    pub on_change: Callback<ScheduleDraft>,
}

fn text_setter(
    props: &ScheduleFieldsProps,
    apply: fn(&mut ScheduleDraft, String),
) -> Callback<InputEvent> {
    let draft = props.draft.clone();
    let on_change = props.on_change.clone();
    Callback::from(move |e: InputEvent| {
        let input: HtmlInputElement = e.target_unchecked_into();
        let mut next = draft.clone();
        apply(&mut next, input.value());
        on_change.emit(next);
    })
}

#[function_component(ScheduleFields)]
pub fn schedule_fields(props: &ScheduleFieldsProps) -> Html {
    let draft = &props.draft;

    let on_start = text_setter(props, |d, v| d.start = v);
    let on_end = text_setter(props, |d, v| d.end = v);
    let on_until = text_setter(props, |d, v| d.until = v);

    let on_recurring = {
        let draft = draft.clone();
        let on_change = props.on_change.clone();
        Callback::from(move |e: Event| {
            let input: HtmlInputElement = e.target_unchecked_into();
            on_change.emit(ScheduleDraft {
                is_recurring: input.checked(),
                ..draft.clone()
            });
        })
    };

    let on_pattern = {
        let draft = draft.clone();
        let on_change = props.on_change.clone();
        Callback::from(move |e: Event| {
            let select: HtmlSelectElement = e.target_unchecked_into();
            if let Ok(pattern) = select.value().parse::<RecurrencePattern>() {
                on_change.emit(ScheduleDraft {
                    pattern,
                    ..draft.clone()
                });
            }
        })
    };

    let preview = match draft.definition() {
        Ok(definition) => {
            let all = expand(&definition, MAX_INSTANCES_LIMIT);
            let hidden = all.len().saturating_sub(PREVIEW_INSTANCES);
            html! {
                <div class="schedule-preview">
                    <p class="preview-label">
                        {format!(
                            "{} · {} occurrence(s)",
                            format_pattern(definition.cadence()),
                            all.len()
                        )}
                    </p>
                    <ul>
                        { for all.iter().take(PREVIEW_INSTANCES).map(|o| html! {
                            <li>{format_occurrence(o)}</li>
                        }) }
                    </ul>
                    {if hidden > 0 {
                        html! { <p class="preview-more">{format!("+ {} more", hidden)}</p> }
                    } else {
                        html! {}
                    }}
                </div>
            }
        }
        Err(message) => html! { <p class="preview-hint">{message}</p> },
    };

    html! {
        <fieldset class="schedule-fields">
            <label>
                {"Start (UTC)"}
                <input type="datetime-local" value={draft.start.clone()} oninput={on_start} />
            </label>
            <label>
                {"End (UTC)"}
                <input type="datetime-local" value={draft.end.clone()} oninput={on_end} />
            </label>
            <label class="checkbox">
                <input type="checkbox" checked={draft.is_recurring} onchange={on_recurring} />
                {"Repeats"}
            </label>
            {if draft.is_recurring {
                html! {
                    <>
                        <label>
                            {"Every"}
                            <select onchange={on_pattern}>
                                { for RecurrencePattern::ALL.iter().map(|p| html! {
                                    <option value={p.as_str()} selected={*p == draft.pattern}>
                                        {p.label()}
                                    </option>
                                }) }
                            </select>
                        </label>
                        <label>
                            {"Until"}
                            <input type="date" value={draft.until.clone()} oninput={on_until} />
                        </label>
                    </>
                }
            } else {
                html! {}
            }}
            {preview}
        </fieldset>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn draft(start: &str, end: &str) -> ScheduleDraft {
        ScheduleDraft {
            start: start.to_string(),
            end: end.to_string(),
            ..ScheduleDraft::default()
        }
    }

    #[test]
    fn test_parse_input_datetime() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 4, 9, 30, 0).unwrap();
        assert_eq!(parse_input_datetime("2024-03-04T09:30"), Some(expected));
        assert_eq!(parse_input_datetime("2024-03-04T09:30:00"), Some(expected));
        assert_eq!(parse_input_datetime(""), None);
        assert_eq!(parse_input_datetime("next tuesday"), None);
    }

    #[test]
    fn test_single_draft() {
        let definition = draft("2024-01-01T10:00", "2024-01-01T12:00")
            .definition()
            .unwrap();
        assert!(!definition.is_recurring);
        assert_eq!(expand(&definition, PREVIEW_INSTANCES).len(), 1);
    }

    #[test]
    fn test_recurring_draft_expands_until_end_date() {
        let draft = ScheduleDraft {
            is_recurring: true,
            pattern: RecurrencePattern::Weekly,
            until: "2024-01-22".to_string(),
            ..draft("2024-01-01T10:00", "2024-01-01T12:00")
        };
        let definition = draft.definition().unwrap();
        assert_eq!(definition.recurrence_pattern, Some(RecurrencePattern::Weekly));
        assert_eq!(expand(&definition, MAX_INSTANCES_LIMIT).len(), 4);
    }

    #[test]
    fn test_until_ignored_when_not_repeating() {
        let draft = ScheduleDraft {
            until: "garbage".to_string(),
            ..draft("2024-01-01T10:00", "2024-01-01T12:00")
        };
        assert!(draft.definition().is_ok());
    }

    #[test]
    fn test_invalid_drafts() {
        assert_eq!(
            draft("", "2024-01-01T12:00").definition().unwrap_err(),
            "Start time is required"
        );
        assert_eq!(
            draft("2024-01-01T12:00", "2024-01-01T10:00")
                .definition()
                .unwrap_err(),
            "end_datetime must be after start_datetime"
        );

        let bad_until = ScheduleDraft {
            is_recurring: true,
            until: "soon".to_string(),
            ..draft("2024-01-01T10:00", "2024-01-01T12:00")
        };
        assert_eq!(bad_until.definition().unwrap_err(), "Repeat until must be a date");
    }

    #[test]
    fn test_format_occurrence() {
        let same_day = Occurrence {
            start_datetime: Utc.with_ymd_and_hms(2024, 1, 1, 22, 0, 0).unwrap(),
            end_datetime: Utc.with_ymd_and_hms(2024, 1, 1, 23, 30, 0).unwrap(),
        };
        assert_eq!(format_occurrence(&same_day), "Mon 2024-01-01 22:00 → 23:30");

        let overnight = Occurrence {
            start_datetime: Utc.with_ymd_and_hms(2024, 1, 1, 22, 0, 0).unwrap(),
            end_datetime: Utc.with_ymd_and_hms(2024, 1, 2, 6, 0, 0).unwrap(),
        };
        assert_eq!(
            format_occurrence(&overnight),
            "Mon 2024-01-01 22:00 → Tue 2024-01-02 06:00"
        );
    }
}
