// Library surface for the binary and the headless integration tests.
pub mod app;
pub mod app_dirs;
pub mod celebration;
pub mod config;
pub mod error;
pub mod hint;
pub mod input;
pub mod lock;
pub mod logging;
pub mod notify;
pub mod presentation;
pub mod runtime;
pub mod session;
pub mod store;
pub mod ui;
pub mod viewer;

pub use error::{Error, Result};
