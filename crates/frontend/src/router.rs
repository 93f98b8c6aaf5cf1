use yew::prelude::*;
use yew_router::prelude::*;

use crate::pages::{
    calendar::CalendarView, dashboard::Dashboard, login::Login, not_found::NotFound,
    shifts::ShiftList, study::StudyList, workplaces::WorkplaceManager,
};

#[derive(Clone, Routable, PartialEq)]
pub enum Route {
    #[at("/")]
    Dashboard,
    #[at("/login")]
    Login,
    #[at("/calendar")]
    Calendar,
    #[at("/shifts")]
    Shifts,
    #[at("/study")]
    Study,
    #[at("/workplaces")]
    Workplaces,
    #[not_found]
    #[at("/404")]
    NotFound,
}

pub fn switch(routes: Route) -> Html {
    match routes {
        Route::Dashboard => html! { <Dashboard /> },
        Route::Login => html! { <Login /> },
        Route::Calendar => html! { <CalendarView /> },
        Route::Shifts => html! { <ShiftList /> },
        Route::Study => html! { <StudyList /> },
        Route::Workplaces => html! { <WorkplaceManager /> },
        Route::NotFound => html! { <NotFound /> },
    }
}
