use shared_types::{CalendarEntry, DashboardSummary};
use yew::prelude::*;

use crate::pages::workplaces::format_cents;
use crate::services::api;
use crate::session::use_failure_handler;

fn format_minutes(minutes: i64) -> String {
    format!("{}h {:02}m", minutes / 60, minutes % 60)
}

fn upcoming(label: &str, entry: &Option<CalendarEntry>) -> Html {
    match entry {
        Some(entry) => html! {
            <div class="upcoming">
                <h3>{label}</h3>
                <p class="upcoming-title">{&entry.title}</p>
                <p class="upcoming-time">
                    {entry.start_datetime.format("%a %Y-%m-%d %H:%M").to_string()}
                    {" · "}
                    {&entry.recurrence_label}
                </p>
            </div>
        },
        None => html! {
            <div class="upcoming">
                <h3>{label}</h3>
                <p class="empty-state">{"Nothing scheduled"}</p>
            </div>
        },
    }
}

#[function_component(Dashboard)]
pub fn dashboard() -> Html {
    let summary = use_state(|| None::<DashboardSummary>);
    let error = use_state(|| None::<String>);
    let on_failure = use_failure_handler(error.clone());

    {
        let summary = summary.clone();
        use_effect_with((), move |_| {
            wasm_bindgen_futures::spawn_local(async move {
                match api::get::<DashboardSummary>("/api/dashboard").await {
                    Ok(data) => summary.set(Some(data)),
                    Err(failure) => on_failure.emit(failure),
                }
            });
            || ()
        });
    }

    if let Some(err) = &*error {
        return html! {
            <div class="dashboard">
                <h2>{"This week"}</h2>
                <p class="error">{err}</p>
            </div>
        };
    }

    let Some(summary) = &*summary else {
        return html! {
            <div class="dashboard">
                <h2>{"This week"}</h2>
                <p class="loading">{"Loading..."}</p>
            </div>
        };
    };

    html! {
        <div class="dashboard">
            <h2>
                {format!(
                    "This week ({} to {})",
                    summary.week_start.format("%b %d"),
                    summary.week_end.format("%b %d")
                )}
            </h2>
            <div class="stats">
                <div class="stat">
                    <span class="stat-value">{format_minutes(summary.shift_minutes)}</span>
                    <span class="stat-label">{"Worked"}</span>
                </div>
                <div class="stat">
                    <span class="stat-value">{format_minutes(summary.study_minutes)}</span>
                    <span class="stat-label">{"Studied"}</span>
                </div>
                <div class="stat">
                    <span class="stat-value">{format_cents(summary.earnings_cents)}</span>
                    <span class="stat-label">{"Earned"}</span>
                </div>
                <div class="stat">
                    <span class="stat-value">{summary.active_series}</span>
                    <span class="stat-label">{"Active series"}</span>
                </div>
            </div>
            {upcoming("Next shift", &summary.next_shift)}
            {upcoming("Next study session", &summary.next_study_session)}
            <h3>{"By workplace"}</h3>
            {if summary.workplaces.is_empty() {
                html! { <p class="empty-state">{"No shifts this week."}</p> }
            } else {
                html! {
                    <table class="workplace-summary">
                        <tr><th>{"Workplace"}</th><th>{"Hours"}</th><th>{"Earnings"}</th></tr>
                        { for summary.workplaces.iter().map(|w| html! {
                            <tr key={w.workplace_id.to_string()}>
                                <td>{&w.name}</td>
                                <td>{format_minutes(w.minutes)}</td>
                                <td>{format_cents(w.earnings_cents)}</td>
                            </tr>
                        }) }
                    </table>
                }
            }}
        </div>
    }
}
