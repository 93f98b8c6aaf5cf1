//! Signed-in user state shared with every page.

use shared_types::AuthUserResponse;
use yew::prelude::*;
use yew_router::prelude::*;

use crate::router::Route;
use crate::services::api::ApiFailure;

#[derive(Clone, PartialEq)]
pub struct Session {
    pub user: Option<AuthUserResponse>,
    pub set_user: Callback<Option<AuthUserResponse>>,
}

/// Turns a failed API call into UI state: an expired session sends the user
/// back to the login page, anything else is shown inline.
#[hook]
pub fn use_failure_handler(error: UseStateHandle<Option<String>>) -> Callback<ApiFailure> {
    let navigator = use_navigator();
    let session = use_context::<Session>();
    Callback::from(move |failure: ApiFailure| match failure {
        ApiFailure::Unauthorized => {
            tracing::info!("Session expired, returning to login");
            if let Some(session) = &session {
                session.set_user.emit(None);
            }
            if let Some(navigator) = &navigator {
                navigator.push(&Route::Login);
            }
        }
        ApiFailure::Failed(message) => {
            tracing::warn!("API call failed: {}", message);
            error.set(Some(message));
        }
    })
}
