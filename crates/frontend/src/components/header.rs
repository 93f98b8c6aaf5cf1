use yew::prelude::*;
use yew_router::prelude::*;

use crate::router::Route;
use crate::services::api;
use crate::session::Session;

#[function_component(Header)]
pub fn header() -> Html {
    let session = use_context::<Session>();
    let route = use_route::<Route>();
    let navigator = use_navigator();

    let user = session.as_ref().and_then(|s| s.user.clone());

    let on_logout = {
        let session = session.clone();
        Callback::from(move |_| {
            let session = session.clone();
            let navigator = navigator.clone();
            wasm_bindgen_futures::spawn_local(async move {
                // The cookie is cleared either way once the server answers.
                if let Err(e) = api::post_empty("/api/auth/logout").await {
                    tracing::warn!("Logout request failed: {}", e);
                }
                if let Some(session) = session {
                    session.set_user.emit(None);
                }
                if let Some(navigator) = navigator {
                    navigator.push(&Route::Login);
                }
            });
        })
    };

    let link = |target: Route, label: &'static str| {
        let class = if route.as_ref() == Some(&target) {
            "nav-btn active"
        } else {
            "nav-btn"
        };
        html! { <Link<Route> to={target} classes={classes!(class)}>{ label }</Link<Route>> }
    };

    html! {
        <header class="header">
            <h1>{ "ShiftSync" }</h1>
            {match user {
                Some(user) => html! {
                    <nav class="main-nav">
                        {link(Route::Dashboard, "Dashboard")}
                        {link(Route::Calendar, "Calendar")}
                        {link(Route::Shifts, "Shifts")}
                        {link(Route::Study, "Study")}
                        {link(Route::Workplaces, "Workplaces")}
                        <span class="nav-user">{ user.name.unwrap_or(user.email) }</span>
                        <button class="nav-btn" onclick={on_logout}>{ "Log out" }</button>
                    </nav>
                },
                None => html! {},
            }}
        </header>
    }
}
