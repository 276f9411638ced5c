//! SQL-backed query resolution for hickory-dns handler chains.
//!
//! This crate answers DNS queries out of a relational store in the
//! PowerDNS "generic SQL backend" style: records are rows with a string
//! type tag and flat string content. A query is resolved by exact match
//! first, then by a wildcard search under the nearest ancestor zone;
//! unknown names get a synthetic SOA for negative-answer caching, and
//! anything still unanswered is deferred to the next handler in the chain.

pub mod database;
pub mod error;
pub mod handler;
pub mod rr;

pub use self::database::{SqliteConfiguration, SqliteStore};
pub use self::error::{HandlerError, StoreError};
pub use self::handler::{DnsHandler, RecordLookup, RecordStore, SqlHandler};
