//! Row-level data model and record synthesis.
//!
//! Rows come out of the store as loosely-typed strings (the generic SQL
//! backend layout: a name, an uppercase type tag, free-form content). The
//! modules here turn those rows into concrete `hickory_proto` resource
//! records, and carry the name machinery used by the wildcard search.

pub(crate) mod encode;
mod id;
pub mod name;
mod record;
pub mod soa;
mod zone;

pub use self::encode::encode;
pub use self::id::{RecordId, ZoneId};
pub use self::name::wildcard_match;
pub use self::record::{RecordFilter, RecordRow};
pub use self::zone::ZoneRow;
