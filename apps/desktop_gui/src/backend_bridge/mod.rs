//! Bridge between the egui thread and the backend worker that owns the slideshow.

pub mod commands;
pub mod runtime;
