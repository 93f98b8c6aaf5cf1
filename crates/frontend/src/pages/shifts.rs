use chrono::Utc;
use shared_types::{
    format_pattern, is_currently_active, next_occurrence, CreateShiftRequest, Scheduled, Shift,
    Workplace,
};
use uuid::Uuid;
use web_sys::{HtmlInputElement, HtmlSelectElement};
use yew::prelude::*;

use crate::components::schedule_fields::{format_occurrence, ScheduleDraft, ScheduleFields};
use crate::services::api;
use crate::session::use_failure_handler;

#[function_component(ShiftList)]
pub fn shift_list() -> Html {
    let shifts = use_state(Vec::<Shift>::new);
    let workplaces = use_state(Vec::<Workplace>::new);
    let loading = use_state(|| true);
    let error = use_state(|| None::<String>);
    let workplace_id = use_state(|| None::<Uuid>);
    let title = use_state(String::new);
    let notes = use_state(String::new);
    let draft = use_state(ScheduleDraft::default);
    let refresh_trigger = use_state(|| 0u32);
    let on_failure = use_failure_handler(error.clone());

    // Fetch shifts and workplaces
    {
        let shifts = shifts.clone();
        let workplaces = workplaces.clone();
        let workplace_id = workplace_id.clone();
        let loading = loading.clone();
        let on_failure = on_failure.clone();
        use_effect_with(*refresh_trigger, move |_| {
            wasm_bindgen_futures::spawn_local(async move {
                match api::get::<Vec<Workplace>>("/api/workplaces").await {
                    Ok(data) => {
                        if workplace_id.is_none() {
                            workplace_id.set(data.first().map(|w| w.id));
                        }
                        workplaces.set(data);
                    }
                    Err(failure) => {
                        on_failure.emit(failure);
                        loading.set(false);
                        return;
                    }
                }

                match api::get::<Vec<Shift>>("/api/shifts").await {
                    Ok(data) => shifts.set(data),
                    Err(failure) => on_failure.emit(failure),
                }
                loading.set(false);
            });
            || ()
        });
    }

    let on_workplace = {
        let workplace_id = workplace_id.clone();
        Callback::from(move |e: Event| {
            let select: HtmlSelectElement = e.target_unchecked_into();
            workplace_id.set(select.value().parse().ok());
        })
    };

    let on_title = {
        let title = title.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            title.set(input.value());
        })
    };

    let on_notes = {
        let notes = notes.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            notes.set(input.value());
        })
    };

    let on_draft = {
        let draft = draft.clone();
        Callback::from(move |next: ScheduleDraft| draft.set(next))
    };

    let on_create = {
        let workplace_id = workplace_id.clone();
        let title = title.clone();
        let notes = notes.clone();
        let draft = draft.clone();
        let error = error.clone();
        let refresh_trigger = refresh_trigger.clone();
        let on_failure = on_failure.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let Some(selected_workplace) = *workplace_id else {
                error.set(Some("Pick a workplace first".to_string()));
                return;
            };
            let definition = match draft.definition() {
                Ok(definition) => definition,
                Err(message) => {
                    error.set(Some(message));
                    return;
                }
            };
            let request = CreateShiftRequest {
                workplace_id: selected_workplace,
                title: Some(title.trim().to_string()).filter(|t| !t.is_empty()),
                start_datetime: definition.start_datetime,
                end_datetime: definition.end_datetime,
                is_recurring: definition.is_recurring,
                recurrence_pattern: definition.recurrence_pattern,
                recurrence_end_date: definition.recurrence_end_date,
                notes: Some(notes.trim().to_string()).filter(|n| !n.is_empty()),
            };

            let title = title.clone();
            let notes = notes.clone();
            let draft = draft.clone();
            let error = error.clone();
            let refresh_trigger = refresh_trigger.clone();
            let on_failure = on_failure.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match api::post::<_, Shift>("/api/shifts", &request).await {
                    Ok(_) => {
                        title.set(String::new());
                        notes.set(String::new());
                        draft.set(ScheduleDraft::default());
                        error.set(None);
                        refresh_trigger.set(*refresh_trigger + 1);
                    }
                    Err(failure) => on_failure.emit(failure),
                }
            });
        })
    };

    let delete_shift = {
        let refresh_trigger = refresh_trigger.clone();
        let on_failure = on_failure.clone();
        Callback::from(move |id: Uuid| {
            if !gloo::dialogs::confirm("Delete this shift and every repeat of it?") {
                return;
            }
            let refresh_trigger = refresh_trigger.clone();
            let on_failure = on_failure.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match api::delete(&format!("/api/shifts/{}", id)).await {
                    Ok(()) => refresh_trigger.set(*refresh_trigger + 1),
                    Err(failure) => on_failure.emit(failure),
                }
            });
        })
    };

    if *loading {
        return html! {
            <div class="shift-container">
                <h2>{"Shifts"}</h2>
                <p class="loading">{"Loading shifts..."}</p>
            </div>
        };
    }

    let now = Utc::now();
    let workplace_list = (*workplaces).clone();

    html! {
        <div class="shift-container">
            <h2>{"Shifts"}</h2>
            {if workplace_list.is_empty() {
                html! { <p class="empty-state">{"Add a workplace before logging shifts."}</p> }
            } else {
                html! {
                    <form class="shift-form" onsubmit={on_create}>
                        <select onchange={on_workplace}>
                            { for workplace_list.iter().map(|w| html! {
                                <option value={w.id.to_string()} selected={Some(w.id) == *workplace_id}>
                                    {&w.name}
                                </option>
                            }) }
                        </select>
                        <input
                            type="text"
                            placeholder="Title (defaults to the workplace)"
                            value={(*title).clone()}
                            oninput={on_title}
                        />
                        <ScheduleFields draft={(*draft).clone()} on_change={on_draft} />
                        <input
                            type="text"
                            placeholder="Notes"
                            value={(*notes).clone()}
                            oninput={on_notes}
                        />
                        <button type="submit">{"Add Shift"}</button>
                    </form>
                }
            }}
            {if let Some(err) = &*error {
                html! { <p class="error">{err}</p> }
            } else {
                html! {}
            }}
            <p class="shift-count">{format!("{} shifts", shifts.len())}</p>
            <div class="shift-list">
                {shifts.iter().map(|shift| {
                    let workplace = workplace_list.iter().find(|w| w.id == shift.workplace_id);
                    let heading = shift
                        .title
                        .clone()
                        .or_else(|| workplace.map(|w| w.name.clone()))
                        .unwrap_or_else(|| "Shift".to_string());
                    let definition = shift.recurrence();
                    let next = next_occurrence(&definition, now);
                    let id = shift.id;
                    let delete = delete_shift.clone();

                    html! {
                        <div
                            key={id.to_string()}
                            class="shift-item"
                            style={format!("border-left-color: {}", workplace.and_then(|w| w.color.as_deref()).unwrap_or("#cccccc"))}
                        >
                            <h3>{heading}</h3>
                            <p class="shift-time">{format_occurrence(&definition.first_occurrence())}</p>
                            <p class="shift-recurrence">
                                {format_pattern(definition.cadence())}
                                {if let Some(until) = shift.recurrence_end_date {
                                    html! { <>{format!(" until {}", until)}</> }
                                } else {
                                    html! {}
                                }}
                                {if is_currently_active(&definition, now) {
                                    html! { <span class="active-badge">{"Active"}</span> }
                                } else {
                                    html! {}
                                }}
                            </p>
                            {match next {
                                Some(next) => html! { <p class="shift-next">{format!("Next: {}", format_occurrence(&next))}</p> },
                                None => html! {},
                            }}
                            {if let Some(notes) = &shift.notes {
                                html! { <p class="description">{notes}</p> }
                            } else {
                                html! {}
                            }}
                            <button class="delete-btn" onclick={Callback::from(move |_| delete.emit(id))}>{"Delete"}</button>
                        </div>
                    }
                }).collect::<Html>()}
            </div>
        </div>
    }
}
