//! MindInk Application
//!
//! Console shell around the editor: keyboard shortcuts, a line-oriented
//! command console and session auto-save.

mod app;
pub mod console;
mod shortcuts;

pub use app::{App, AppConfig, AppError, CONFIG_ENV, DATA_DIR_ENV};
pub use console::{ConsoleCommand, ConsoleError};
pub use shortcuts::{Shortcut, ShortcutAction, ShortcutRegistry, parse_chord};
