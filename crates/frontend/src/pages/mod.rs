pub mod calendar;
pub mod dashboard;
pub mod login;
pub mod not_found;
pub mod shifts;
pub mod study;
pub mod workplaces;
