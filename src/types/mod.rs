mod api;
mod events;

pub use api::*;
pub use events::*;
