//! Ratatui front end: screens over the part lists, the search browser and
//! settings, with modal forms layered on top.

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
