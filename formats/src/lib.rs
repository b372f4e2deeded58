//! Consumer grammars built on bitoracle oracles.
//!
//! - [`gif`] - the GIF 87a/89a container, including extensions.
//! - [`pgp`] - PGP 2.x packets as found in keyrings and messages.
//!
//! Both parsers build their oracles once in `new()` and can then be shared
//! freely; every parse is independent.

pub mod gif;
pub mod pgp;

pub use gif::GifParser;
pub use pgp::{Packet, PacketKind, PgpParser};
