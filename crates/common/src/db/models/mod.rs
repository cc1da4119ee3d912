//! SeaORM entity models
//!
//! Database entities for VoiceNotes

mod note;

pub use note::{
    Entity as NoteEntity,
    Model as NoteRecord,
    ActiveModel as NoteActiveModel,
    Column as NoteColumn,
};
