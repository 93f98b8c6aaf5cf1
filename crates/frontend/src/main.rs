mod components;
mod pages;
mod router;
mod services;
mod session;

use shared_types::AuthUserResponse;
use yew::prelude::*;
use yew_router::prelude::*;

use crate::router::{switch, Route};
use crate::services::api;
use crate::session::Session;

#[function_component(App)]
fn app() -> Html {
    html! {
        <BrowserRouter>
            <Shell />
        </BrowserRouter>
    }
}

/// Owns the session and lays out every page under the header.
#[function_component(Shell)]
fn shell() -> Html {
    let user = use_state(|| None::<AuthUserResponse>);
    let navigator = use_navigator();

    // Restore an existing session from the cookie
    {
        let user = user.clone();
        use_effect_with((), move |_| {
            wasm_bindgen_futures::spawn_local(async move {
                match api::get::<AuthUserResponse>("/api/auth/me").await {
                    Ok(me) => user.set(Some(me)),
                    Err(e) => {
                        tracing::debug!("No active session: {}", e);
                        if let Some(navigator) = navigator {
                            navigator.push(&Route::Login);
                        }
                    }
                }
            });
            || ()
        });
    }

    let session = Session {
        user: (*user).clone(),
        set_user: {
            let user = user.clone();
            Callback::from(move |next: Option<AuthUserResponse>| user.set(next))
        },
    };

    html! {
        <ContextProvider<Session> context={session}>
            <div id="app">
                <components::header::Header />
                <main>
                    <Switch<Route> render={switch} />
                </main>
            </div>
        </ContextProvider<Session>>
    }
}

fn main() {
    tracing_wasm::set_as_global_default();

    yew::Renderer::<App>::new().render();
}
