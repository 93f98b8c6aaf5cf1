use shared_types::{AuthUserResponse, LoginRequest, RegisterRequest};
use web_sys::HtmlInputElement;
use yew::prelude::*;
use yew_router::prelude::*;

use crate::router::Route;
use crate::services::api::{self, ApiFailure};
use crate::session::Session;

#[function_component(Login)]
pub fn login() -> Html {
    let session = use_context::<Session>();
    let navigator = use_navigator();
    let registering = use_state(|| false);
    let email = use_state(String::new);
    let password = use_state(String::new);
    let name = use_state(String::new);
    let error = use_state(|| None::<String>);
    let submitting = use_state(|| false);

    let on_email = {
        let email = email.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            email.set(input.value());
        })
    };

    let on_password = {
        let password = password.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            password.set(input.value());
        })
    };

    let on_name = {
        let name = name.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            name.set(input.value());
        })
    };

    let toggle_mode = {
        let registering = registering.clone();
        let error = error.clone();
        Callback::from(move |_| {
            registering.set(!*registering);
            error.set(None);
        })
    };

    let on_submit = {
        let registering = *registering;
        let email = (*email).clone();
        let password = (*password).clone();
        let name = (*name).clone();
        let error = error.clone();
        let submitting = submitting.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let email = email.trim().to_string();
            let password = password.clone();
            let name = Some(name.trim().to_string()).filter(|n| !n.is_empty());
            let error = error.clone();
            let submitting = submitting.clone();
            let session = session.clone();
            let navigator = navigator.clone();
            submitting.set(true);
            wasm_bindgen_futures::spawn_local(async move {
                let result = if registering {
                    let request = RegisterRequest {
                        email,
                        password,
                        name,
                    };
                    api::post::<_, AuthUserResponse>("/api/auth/register", &request).await
                } else {
                    let request = LoginRequest { email, password };
                    api::post::<_, AuthUserResponse>("/api/auth/login", &request).await
                };
                submitting.set(false);

                match result {
                    Ok(user) => {
                        error.set(None);
                        if let Some(session) = session {
                            session.set_user.emit(Some(user));
                        }
                        if let Some(navigator) = navigator {
                            navigator.push(&Route::Dashboard);
                        }
                    }
                    Err(ApiFailure::Unauthorized) => {
                        error.set(Some("Invalid email or password".to_string()));
                    }
                    Err(ApiFailure::Failed(message)) => error.set(Some(message)),
                }
            });
        })
    };

    html! {
        <div class="login-container">
            <h2>{if *registering { "Create an account" } else { "Log in" }}</h2>
            <form class="login-form" onsubmit={on_submit}>
                <input
                    type="email"
                    placeholder="Email"
                    value={(*email).clone()}
                    oninput={on_email}
                />
                <input
                    type="password"
                    placeholder="Password"
                    value={(*password).clone()}
                    oninput={on_password}
                />
                {if *registering {
                    html! {
                        <input
                            type="text"
                            placeholder="Name (optional)"
                            value={(*name).clone()}
                            oninput={on_name}
                        />
                    }
                } else {
                    html! {}
                }}
                <button type="submit" disabled={*submitting}>
                    {if *registering { "Register" } else { "Log in" }}
                </button>
            </form>
            {if let Some(err) = &*error {
                html! { <p class="error">{err}</p> }
            } else {
                html! {}
            }}
            <button class="link-btn" onclick={toggle_mode}>
                {if *registering { "Have an account? Log in" } else { "New here? Register" }}
            </button>
        </div>
    }
}
