use hickory_proto::rr::{LowerName, RecordType};

use super::name::bare_name;
use super::{RecordId, ZoneId};

/// A record row from the store.
///
/// This is the generic SQL backend layout: the type is an uppercase string
/// tag and the content is a free-form string whose interpretation depends on
/// the type (see [`encode`][super::encode]).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordRow {
    /// Assigned by the store on insert.
    pub id: RecordId,
    /// Owning zone; unset for flat rows only reachable by exact lookup.
    pub zone_id: Option<ZoneId>,
    /// Owner name without a trailing dot. May contain `*` labels.
    pub name: String,
    /// Uppercase record type tag ("A", "SOA", ...). Empty matches any type.
    pub rtype: String,
    pub content: String,
    pub ttl: u32,
    /// MX preference / SRV priority.
    pub priority: u16,
    /// Disabled rows are never returned by exact-match lookups.
    pub disabled: bool,
}

impl RecordRow {
    pub fn new(
        name: impl Into<String>,
        rtype: impl Into<String>,
        content: impl Into<String>,
        ttl: u32,
    ) -> Self {
        RecordRow {
            name: name.into(),
            rtype: rtype.into(),
            content: content.into(),
            ttl,
            ..Default::default()
        }
    }
}

/// Exact-lookup filter handed to the store.
///
/// Disabled rows are excluded by contract; the filter only carries the owner
/// name (bare form) and the type tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFilter {
    pub name: String,
    /// Type tag to match; the empty string matches any type.
    pub rtype: String,
}

impl RecordFilter {
    /// Build the lookup filter for a query.
    ///
    /// The query name loses its trailing dot (stored rows are bare), and an
    /// ANY query clears the type so the store matches every type.
    pub fn new(qname: &LowerName, qtype: RecordType) -> Self {
        let rtype = match qtype {
            RecordType::ANY => String::new(),
            other => other.to_string(),
        };
        RecordFilter {
            name: bare_name(&qname.to_string()).to_string(),
            rtype,
        }
    }

    /// The same owner name with a different type tag.
    pub fn with_record_type(&self, qtype: RecordType) -> Self {
        RecordFilter {
            name: self.name.clone(),
            rtype: qtype.to_string(),
        }
    }
}
