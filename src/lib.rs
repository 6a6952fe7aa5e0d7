pub mod action;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod gap;
pub mod generation;
pub mod locale;
pub mod metrics;
pub mod providers;
pub mod resolver;
pub mod retry;
pub mod richtext;
pub mod schema;
pub mod store;
pub mod translation;
pub mod validator;

pub use action::{ActionResult, TranslateAction};
pub use error::TranslateError;
pub use store::{ContentItem, Document, JsonFileItem};
