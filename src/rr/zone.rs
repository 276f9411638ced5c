use super::ZoneId;

/// A zone row from the store.
///
/// Zones group records for the wildcard search; the resolution path otherwise
/// ignores them. `kind` (native/primary/secondary) and `master` are carried
/// for the provisioning tools that own the table, not interpreted here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneRow {
    /// Assigned by the store on insert.
    pub id: ZoneId,
    /// Zone apex name, without a trailing dot.
    pub name: String,
    pub master: String,
    pub kind: String,
}

impl ZoneRow {
    pub fn new(name: impl Into<String>) -> Self {
        ZoneRow {
            name: name.into(),
            ..Default::default()
        }
    }
}
