pub mod commands;
pub mod controller;
pub mod editor;
pub mod state;
mod writer;

pub use controller::JournalController;
pub use editor::{EveningEditor, MorningEditor, RoutineEditor};
pub use state::{reduce, JournalAction, JournalState};
