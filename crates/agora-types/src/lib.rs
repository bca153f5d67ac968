//! Shared type definitions for the Agora social simulation.
//!
//! Types defined here are used by the engine, the workload driver, and the
//! HTTP gateway. Entity records also flow to `TypeScript` via `ts-rs`.
//!
//! # Modules
//!
//! - [`ids`] -- Typed 128-bit identifiers for posts and comments
//! - [`structs`] -- Entity records (posts, comments, direct messages)

pub mod ids;
pub mod structs;

pub use ids::{CommentId, IdParseError, PostId};
pub use structs::{Comment, DirectMessage, Post};

#[cfg(test)]
mod tests {
    #[test]
    fn export_bindings() {
        use ts_rs::TS;

        let _ = crate::structs::Post::export_all();
        let _ = crate::structs::Comment::export_all();
        let _ = crate::structs::DirectMessage::export_all();
    }
}
