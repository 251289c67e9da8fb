//! EEW push-protocol framing, bulletin classification, and coded-bulletin
//! parsing.
//!
//! This crate is the pure protocol layer shared by the client: wire-frame
//! headers, bulletin type markers, the coded seismic bulletin grammar, and
//! the per-area EBI forecast records. It performs no I/O.

pub mod bulletin;
pub mod code;
pub mod ebi;
pub mod error;
pub mod frame;
pub mod location;
pub mod text;

pub use bulletin::{BasicInfo, Bulletin, BulletinKind};
pub use code::AlertRecord;
pub use ebi::EbiRecord;
pub use error::{ProtocolError, Result};
pub use frame::{Frame, FrameHeader, FrameTag};
pub use location::{CodeOnly, Locale, LocationLookup};
