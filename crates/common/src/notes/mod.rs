//! Notes: model, summary state machine, storage and operations

mod model;
pub mod service;
pub mod state;
pub mod store;

pub use model::Note;
pub use service::{NewNote, NoteService, NoteUpdate};
pub use state::{InvalidSummaryState, SummaryState};
pub use store::{InMemoryNoteStore, NoteStore};
