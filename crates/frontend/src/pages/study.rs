use chrono::Utc;
use shared_types::{
    format_pattern, next_occurrence, CreateStudySessionRequest, Scheduled, StudySession,
};
use uuid::Uuid;
use web_sys::HtmlInputElement;
use yew::prelude::*;

use crate::components::schedule_fields::{format_occurrence, ScheduleDraft, ScheduleFields};
use crate::services::api;
use crate::session::use_failure_handler;

#[function_component(StudyList)]
pub fn study_list() -> Html {
    let sessions = use_state(Vec::<StudySession>::new);
    let loading = use_state(|| true);
    let error = use_state(|| None::<String>);
    let subject = use_state(String::new);
    let location = use_state(String::new);
    let draft = use_state(ScheduleDraft::default);
    let refresh_trigger = use_state(|| 0u32);
    let on_failure = use_failure_handler(error.clone());

    {
        let sessions = sessions.clone();
        let loading = loading.clone();
        let on_failure = on_failure.clone();
        use_effect_with(*refresh_trigger, move |_| {
            wasm_bindgen_futures::spawn_local(async move {
                match api::get::<Vec<StudySession>>("/api/study-sessions").await {
                    Ok(data) => sessions.set(data),
                    Err(failure) => on_failure.emit(failure),
                }
                loading.set(false);
            });
            || ()
        });
    }

    let on_subject = {
        let subject = subject.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            subject.set(input.value());
        })
    };

    let on_location = {
        let location = location.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            location.set(input.value());
        })
    };

    let on_draft = {
        let draft = draft.clone();
        Callback::from(move |next: ScheduleDraft| draft.set(next))
    };

    let on_create = {
        let subject = subject.clone();
        let location = location.clone();
        let draft = draft.clone();
        let error = error.clone();
        let refresh_trigger = refresh_trigger.clone();
        let on_failure = on_failure.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let subject_text = subject.trim().to_string();
            if subject_text.is_empty() {
                error.set(Some("Subject is required".to_string()));
                return;
            }
            let definition = match draft.definition() {
                Ok(definition) => definition,
                Err(message) => {
                    error.set(Some(message));
                    return;
                }
            };
            let request = CreateStudySessionRequest {
                subject: subject_text,
                location: Some(location.trim().to_string()).filter(|l| !l.is_empty()),
                start_datetime: definition.start_datetime,
                end_datetime: definition.end_datetime,
                is_recurring: definition.is_recurring,
                recurrence_pattern: definition.recurrence_pattern,
                recurrence_end_date: definition.recurrence_end_date,
                notes: None,
            };

            let subject = subject.clone();
            let location = location.clone();
            let draft = draft.clone();
            let error = error.clone();
            let refresh_trigger = refresh_trigger.clone();
            let on_failure = on_failure.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match api::post::<_, StudySession>("/api/study-sessions", &request).await {
                    Ok(_) => {
                        subject.set(String::new());
                        location.set(String::new());
                        draft.set(ScheduleDraft::default());
                        error.set(None);
                        refresh_trigger.set(*refresh_trigger + 1);
                    }
                    Err(failure) => on_failure.emit(failure),
                }
            });
        })
    };

    let delete_session = {
        let refresh_trigger = refresh_trigger.clone();
        let on_failure = on_failure.clone();
        Callback::from(move |id: Uuid| {
            if !gloo::dialogs::confirm("Delete this study session?") {
                return;
            }
            let refresh_trigger = refresh_trigger.clone();
            let on_failure = on_failure.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match api::delete(&format!("/api/study-sessions/{}", id)).await {
                    Ok(()) => refresh_trigger.set(*refresh_trigger + 1),
                    Err(failure) => on_failure.emit(failure),
                }
            });
        })
    };

    if *loading {
        return html! {
            <div class="study-container">
                <h2>{"Study Sessions"}</h2>
                <p class="loading">{"Loading study sessions..."}</p>
            </div>
        };
    }

    let now = Utc::now();

    html! {
        <div class="study-container">
            <h2>{"Study Sessions"}</h2>
            <form class="study-form" onsubmit={on_create}>
                <input
                    type="text"
                    placeholder="Subject"
                    value={(*subject).clone()}
                    oninput={on_subject}
                />
                <input
                    type="text"
                    placeholder="Location (optional)"
                    value={(*location).clone()}
                    oninput={on_location}
                />
                <ScheduleFields draft={(*draft).clone()} on_change={on_draft} />
                <button type="submit">{"Add Session"}</button>
            </form>
            {if let Some(err) = &*error {
                html! { <p class="error">{err}</p> }
            } else {
                html! {}
            }}
            <div class="study-list">
                {if sessions.is_empty() {
                    html! { <p class="empty-state">{"No study sessions yet."}</p> }
                } else {
                    sessions.iter().map(|session| {
                        let definition = session.recurrence();
                        let id = session.id;
                        let delete = delete_session.clone();

                        html! {
                            <div key={id.to_string()} class="study-item">
                                <h3>{&session.subject}</h3>
                                {if let Some(location) = &session.location {
                                    html! { <p class="study-location">{location}</p> }
                                } else {
                                    html! {}
                                }}
                                <p class="study-time">{format_occurrence(&definition.first_occurrence())}</p>
                                <p class="study-recurrence">{format_pattern(definition.cadence())}</p>
                                {match next_occurrence(&definition, now) {
                                    Some(next) => html! { <p class="study-next">{format!("Next: {}", format_occurrence(&next))}</p> },
                                    None => html! { <p class="study-next">{"Finished"}</p> },
                                }}
                                <button class="delete-btn" onclick={Callback::from(move |_| delete.emit(id))}>{"Delete"}</button>
                            </div>
                        }
                    }).collect::<Html>()
                }}
            </div>
        </div>
    }
}
