//! Terminal UI: app loop, layout, rendering

mod app;
mod event;
pub mod layout;
pub mod render;
mod terminal;

pub use app::App;
