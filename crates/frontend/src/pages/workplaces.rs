use shared_types::{CreateWorkplaceRequest, Workplace};
use uuid::Uuid;
use web_sys::HtmlInputElement;
use yew::prelude::*;

use crate::services::api;
use crate::session::use_failure_handler;

pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    format!("{}${}.{:02}", sign, cents / 100, cents % 100)
}

/// Parse a dollar amount such as `18` or `18.50` into cents. Blank means
/// no rate.
fn parse_rate_cents(raw: &str) -> Result<Option<i32>, String> {
    let raw = raw.trim().trim_start_matches('$');
    if raw.is_empty() {
        return Ok(None);
    }

    let invalid = || format!("\"{}\" is not a valid hourly rate", raw);
    let (dollars, fraction) = raw.split_once('.').unwrap_or((raw, ""));
    if fraction.len() > 2 || !fraction.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let dollars: i32 = dollars.parse().map_err(|_| invalid())?;
    let fraction: i32 = format!("{:0<2}", fraction).parse().map_err(|_| invalid())?;

    dollars
        .checked_mul(100)
        .and_then(|c| c.checked_add(fraction))
        .filter(|c| *c >= 0)
        .map(Some)
        .ok_or_else(invalid)
}

#[function_component(WorkplaceManager)]
pub fn workplace_manager() -> Html {
    let workplaces = use_state(Vec::<Workplace>::new);
    let loading = use_state(|| true);
    let error = use_state(|| None::<String>);
    let new_name = use_state(String::new);
    let new_rate = use_state(String::new);
    let new_color = use_state(|| "#3498db".to_string());
    let new_address = use_state(String::new);
    let refresh_trigger = use_state(|| 0u32);
    let on_failure = use_failure_handler(error.clone());

    {
        let workplaces = workplaces.clone();
        let loading = loading.clone();
        let on_failure = on_failure.clone();
        use_effect_with(*refresh_trigger, move |_| {
            wasm_bindgen_futures::spawn_local(async move {
                match api::get::<Vec<Workplace>>("/api/workplaces").await {
                    Ok(data) => workplaces.set(data),
                    Err(failure) => on_failure.emit(failure),
                }
                loading.set(false);
            });
            || ()
        });
    }

    let input_setter = |state: &UseStateHandle<String>| {
        let state = state.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            state.set(input.value());
        })
    };

    let on_create = {
        let new_name = new_name.clone();
        let new_rate = new_rate.clone();
        let new_color = new_color.clone();
        let new_address = new_address.clone();
        let error = error.clone();
        let refresh_trigger = refresh_trigger.clone();
        let on_failure = on_failure.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let name = new_name.trim().to_string();
            if name.is_empty() {
                return;
            }
            let hourly_rate_cents = match parse_rate_cents(&new_rate) {
                Ok(rate) => rate,
                Err(message) => {
                    error.set(Some(message));
                    return;
                }
            };
            let request = CreateWorkplaceRequest {
                name,
                hourly_rate_cents,
                color: Some((*new_color).clone()),
                address: Some(new_address.trim().to_string()).filter(|a| !a.is_empty()),
            };

            let new_name = new_name.clone();
            let new_rate = new_rate.clone();
            let new_address = new_address.clone();
            let error = error.clone();
            let refresh_trigger = refresh_trigger.clone();
            let on_failure = on_failure.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match api::post::<_, Workplace>("/api/workplaces", &request).await {
                    Ok(_) => {
                        new_name.set(String::new());
                        new_rate.set(String::new());
                        new_address.set(String::new());
                        error.set(None);
                        refresh_trigger.set(*refresh_trigger + 1);
                    }
                    Err(failure) => on_failure.emit(failure),
                }
            });
        })
    };

    let delete_workplace = {
        let refresh_trigger = refresh_trigger.clone();
        let on_failure = on_failure.clone();
        Callback::from(move |id: Uuid| {
            if !gloo::dialogs::confirm("Delete this workplace and all of its shifts?") {
                return;
            }
            let refresh_trigger = refresh_trigger.clone();
            let on_failure = on_failure.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match api::delete(&format!("/api/workplaces/{}", id)).await {
                    Ok(()) => refresh_trigger.set(*refresh_trigger + 1),
                    Err(failure) => on_failure.emit(failure),
                }
            });
        })
    };

    if *loading {
        return html! {
            <div class="workplace-container">
                <h2>{"Workplaces"}</h2>
                <p class="loading">{"Loading workplaces..."}</p>
            </div>
        };
    }

    html! {
        <div class="workplace-container">
            <h2>{"Workplaces"}</h2>
            <form class="workplace-form" onsubmit={on_create}>
                <input
                    type="text"
                    placeholder="Workplace name"
                    value={(*new_name).clone()}
                    oninput={input_setter(&new_name)}
                />
                <input
                    type="text"
                    placeholder="Hourly rate, e.g. 18.50"
                    value={(*new_rate).clone()}
                    oninput={input_setter(&new_rate)}
                />
                <input
                    type="color"
                    value={(*new_color).clone()}
                    oninput={input_setter(&new_color)}
                />
                <input
                    type="text"
                    placeholder="Address (optional)"
                    value={(*new_address).clone()}
                    oninput={input_setter(&new_address)}
                />
                <button type="submit">{"Add Workplace"}</button>
            </form>
            {if let Some(err) = &*error {
                html! { <p class="error">{err}</p> }
            } else {
                html! {}
            }}
            <div class="workplace-list">
                {if workplaces.is_empty() {
                    html! { <p class="empty-state">{"Add the places you work to start logging shifts."}</p> }
                } else {
                    workplaces.iter().map(|workplace| {
                        let id = workplace.id;
                        let delete = delete_workplace.clone();
                        html! {
                            <div key={id.to_string()} class="workplace-item">
                                <span
                                    class="color-swatch"
                                    style={format!("background-color: {}", workplace.color.as_deref().unwrap_or("#cccccc"))}
                                />
                                <span class="workplace-name">{&workplace.name}</span>
                                <span class="workplace-rate">
                                    {match workplace.hourly_rate_cents {
                                        Some(rate) => format!("{}/h", format_cents(i64::from(rate))),
                                        None => "No rate".to_string(),
                                    }}
                                </span>
                                {if let Some(address) = &workplace.address {
                                    html! { <span class="workplace-address">{address}</span> }
                                } else {
                                    html! {}
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(0), "$0.00");
        assert_eq!(format_cents(1850), "$18.50");
        assert_eq!(format_cents(7), "$0.07");
        assert_eq!(format_cents(-250), "-$2.50");
    }

    #[test]
    fn test_parse_rate_cents() {
        assert_eq!(parse_rate_cents(""), Ok(None));
        assert_eq!(parse_rate_cents("  "), Ok(None));
        assert_eq!(parse_rate_cents("18"), Ok(Some(1800)));
        assert_eq!(parse_rate_cents("18.5"), Ok(Some(1850)));
        assert_eq!(parse_rate_cents("$18.05"), Ok(Some(1805)));
        assert_eq!(parse_rate_cents("0.99"), Ok(Some(99)));
    }

    #[test]
    fn test_parse_rate_cents_rejects_garbage() {
        assert!(parse_rate_cents("abc").is_err());
        assert!(parse_rate_cents("1.234").is_err());
        assert!(parse_rate_cents("1.x").is_err());
        assert!(parse_rate_cents("-5").is_err());
        assert!(parse_rate_cents("99999999").is_err());
    }
}
