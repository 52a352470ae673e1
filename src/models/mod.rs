//! Data models for the Game Language Verify catalog.
//!
//! Field names serialize in camelCase to match the web client.

mod catalog;
mod favorite;
mod game;
mod post;
mod reaction;
mod user;
mod version;

pub use catalog::*;
pub use favorite::*;
pub use game::*;
pub use post::*;
pub use reaction::*;
pub use user::*;
pub use version::*;
