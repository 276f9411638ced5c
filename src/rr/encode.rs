//! Row-to-record synthesis.
//!
//! Each stored row is dispatched on its type tag to build a concrete
//! resource record. Rows that cannot be encoded (unsupported type, content
//! that does not fit the type's layout) yield `None` and are skipped by the
//! caller: one bad row must not fail a multi-record answer.

use std::net::{Ipv4Addr, Ipv6Addr};

use hickory_proto::rr::rdata::{A, AAAA, CNAME, MX, NS, PTR, SRV, TXT};
use hickory_proto::rr::{DNSClass, Name, RData, Record};

use super::RecordRow;
use super::soa::parse_soa;

/// Build a resource record from a stored row.
///
/// The owner is the query name (fully qualified); the row only contributes
/// the TTL, priority and content. Returns `None` when the row's type has no
/// encoder or its content is malformed for that type. Invalid A/AAAA
/// literals are the exception: they synthesize the unspecified address
/// instead of dropping the row, preserving the backend's observed behavior.
pub fn encode(row: &RecordRow, owner: Name, class: DNSClass) -> Option<Record> {
    let rdata = match row.rtype.as_str() {
        "A" => {
            let addr = row.content.parse().unwrap_or(Ipv4Addr::UNSPECIFIED);
            RData::A(A::from(addr))
        }
        "AAAA" => {
            let addr = row.content.parse().unwrap_or(Ipv6Addr::UNSPECIFIED);
            RData::AAAA(AAAA::from(addr))
        }
        "TXT" => RData::TXT(TXT::new(vec![row.content.clone()])),
        "NS" => RData::NS(NS(Name::from_utf8(&row.content).ok()?)),
        "PTR" => {
            // stored without the dot, but the answer needs it
            let target = if row.content.ends_with('.') {
                row.content.clone()
            } else {
                format!("{}.", row.content)
            };
            RData::PTR(PTR(Name::from_utf8(target).ok()?))
        }
        "MX" => RData::MX(MX::new(row.priority, Name::from_utf8(&row.content).ok()?)),
        "SRV" => {
            let words: Vec<&str> = row.content.split_whitespace().collect();
            let target = Name::from_utf8(words.get(2)?).ok()?;
            let weight = words[0].parse().unwrap_or_default();
            let port = words[1].parse().unwrap_or_default();
            RData::SRV(SRV::new(row.priority, weight, port, target))
        }
        "CNAME" => RData::CNAME(CNAME(Name::from_utf8(&row.content).ok()?)),
        "SOA" => match parse_soa(&row.content) {
            Ok(soa) => RData::SOA(soa),
            Err(error) => {
                tracing::debug!(name = %row.name, "dropping SOA row: {error}");
                return None;
            }
        },
        other => {
            tracing::debug!(name = %row.name, rtype = %other, "unsupported record type");
            return None;
        }
    };

    let mut record = Record::from_rdata(owner, row.ttl, rdata);
    record.set_dns_class(class);
    Some(record)
}
