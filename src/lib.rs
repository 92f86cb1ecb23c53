pub mod client;
pub mod config;
pub mod document;
pub mod editor;
pub mod error;
pub mod fs;
pub mod paths;
pub mod preview;
pub mod session;
pub mod suggest;
pub mod sync;
pub mod types;

pub use client::{BackendClient, TemplateStore};
pub use editor::{reduce, EditorAction, EditorState};
pub use error::{ClientError, SessionError, SyncError};
