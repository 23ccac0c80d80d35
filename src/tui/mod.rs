pub mod panels;

pub use app::{run_tui, ExitReason};

mod app;
mod canvas;
mod input;
mod launcher;
mod session;
