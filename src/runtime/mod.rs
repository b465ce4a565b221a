//! Event loop plumbing: the context a mode drives turns through, the frontend
//! seam, and the turn runner that bridges the remote stream to the UI.

pub mod context;
pub mod frontend;
pub mod r#loop;
pub mod mode;
pub mod turn;
mod update;

pub use update::UiUpdate;
