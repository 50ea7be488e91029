//! UI layer: the slideshow window.

pub mod app;

pub use app::ScenesApp;
