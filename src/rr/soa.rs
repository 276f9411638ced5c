//! SOA content parsing.
//!
//! The store keeps SOA payloads as a single flat string of seven
//! space-separated fields, the way PowerDNS backends write them:
//!
//! ```text
//! ns1.example.org. hostmaster.example.org. 2024010101 7200 3600 1209600 3600
//! ```

use hickory_proto::ProtoError;
use hickory_proto::rr::Name;
use hickory_proto::rr::rdata::SOA;

#[derive(Debug, thiserror::Error)]
pub enum SoaParseError {
    #[error("expected 7 fields in SOA content, found {0}")]
    MissingFields(usize),

    #[error("SOA {field} is not a valid unsigned integer: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("invalid name in SOA content: {0}")]
    Name(#[from] ProtoError),
}

fn parse_field(field: &'static str, value: &str) -> Result<u32, SoaParseError> {
    value.parse().map_err(|_| SoaParseError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

/// Decode a flat SOA content string into its seven typed fields.
///
/// Fields are split on single spaces; runs of spaces produce empty fields and
/// fail the numeric parses, which is intentional: the payload format is
/// rigid. Extra trailing fields are ignored.
pub fn parse_soa(content: &str) -> Result<SOA, SoaParseError> {
    let fields: Vec<&str> = content.split(' ').collect();
    if fields.len() < 7 {
        return Err(SoaParseError::MissingFields(fields.len()));
    }

    let mname = Name::from_utf8(fields[0])?;
    let rname = Name::from_utf8(fields[1])?;
    let serial = parse_field("serial", fields[2])?;
    let refresh = parse_field("refresh", fields[3])?;
    let retry = parse_field("retry", fields[4])?;
    let expire = parse_field("expire", fields[5])?;
    let minimum = parse_field("minimum", fields[6])?;

    // the timer fields are signed in hickory; reinterpret the bits
    Ok(SOA::new(
        mname,
        rname,
        serial,
        refresh.cast_signed(),
        retry.cast_signed(),
        expire.cast_signed(),
        minimum,
    ))
}
