//! Concord Core - Entity Types
//!
//! Identity, Records, wire payloads, configuration and the error taxonomy.
//! Pure data structures; storage and retrieval live in `concord-storage`.

mod config;
mod entities;
mod enums;
mod error;
mod identity;
mod optional;
mod wire;

pub use config::*;
pub use entities::*;
pub use enums::*;
pub use error::*;
pub use identity::*;
pub use optional::*;
pub use wire::*;
