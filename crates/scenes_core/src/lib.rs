//! Slideshow core: a persisted scene collection, the views bound to it and
//! the context that wires them together.

pub mod app;
pub mod collection;
pub mod error;
pub mod observer;
pub mod script;
pub mod settings;
pub mod template;
pub mod view;

pub use app::{AppContext, AppView, RenderedItem};
pub use collection::SceneCollection;
pub use error::error_report;
pub use observer::{EventHub, Observer, Subscription, SubscriptionId};
pub use script::Script;
pub use settings::{load_settings, Settings};
pub use template::{ItemTemplate, TemplateError};
pub use view::{ItemView, Render};
