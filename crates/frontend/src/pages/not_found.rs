use yew::prelude::*;
use yew_router::prelude::*;

use crate::router::Route;

#[function_component(NotFound)]
pub fn not_found() -> Html {
    html! {
        <div class="container">
            <div class="empty-state">
                <h2>{ "Page not found" }</h2>
                <Link<Route> to={Route::Dashboard}>
                    <button class="btn btn-primary">{ "Back to this week" }</button>
                </Link<Route>>
            </div>
        </div>
    }
}
