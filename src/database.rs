//! SQLite record store.
//!
//! The bundled [`RecordStore`] adapter, using the generic-SQL backend schema
//! (`zone` and `record` tables, string type tags, flat content columns).
//! Provisioning tools own the tables; the resolution path only reads them,
//! apart from the [`add_zone`][SqliteStore::add_zone] /
//! [`add_record`][SqliteStore::add_record] helpers used for seeding.

use std::sync::{Arc, Mutex};

use camino::Utf8PathBuf;
use hickory_proto::rr::RecordType;
use monarch_db::{MonarchDB, StaticMonarchConfiguration};
use rusqlite::{Connection, named_params};
use serde::Deserialize;

use crate::error::StoreError;
use crate::handler::{RecordLookup, RecordStore};
use crate::rr::{RecordFilter, RecordId, RecordRow, ZoneId, ZoneRow};

pub(crate) trait FromRow {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self>
    where
        Self: Sized;
}

const MONARCH: StaticMonarchConfiguration<1> = StaticMonarchConfiguration {
    name: "acorn",
    enable_foreign_keys: true,
    migrations: [include_str!("migrations/01.schema.sql")],
};

/// Configuration for the SQLite backend.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteConfiguration {
    #[serde(default)]
    path: Option<Utf8PathBuf>,
}

/// SqliteStore is a record store over a SQLite database holding DNS zones
/// and records.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn new(connection: Connection) -> Self {
        Self {
            connection: Arc::new(Mutex::new(connection)),
        }
    }

    fn prepare(connection: Connection) -> rusqlite::Result<Self> {
        let db = MonarchDB::from(MONARCH);
        let connection = db.migrate(connection)?;
        Ok(Self::new(connection))
    }

    /// Creates a new SqliteStore instance from a configuration.
    pub fn new_from_config(config: &SqliteConfiguration) -> rusqlite::Result<Self> {
        let connection = if let Some(path) = &config.path {
            rusqlite::Connection::open(path)?
        } else {
            rusqlite::Connection::open_in_memory()?
        };

        Self::prepare(connection)
    }

    /// Creates a new SqliteStore instance from an in-memory database.
    pub fn new_in_memory() -> rusqlite::Result<Self> {
        let connection = rusqlite::Connection::open_in_memory()?;
        Self::prepare(connection)
    }

    /// Insert a zone, returning its assigned id.
    pub fn add_zone(&self, zone: &ZoneRow) -> rusqlite::Result<ZoneId> {
        let conn = self.connection.lock().expect("connection poisoned");
        let zx = ZonePersistence::new(&conn);
        zx.insert(zone)
    }

    /// Insert a record, returning its assigned id.
    pub fn add_record(&self, record: &RecordRow) -> rusqlite::Result<RecordId> {
        let conn = self.connection.lock().expect("connection poisoned");
        let rx = RecordPersistence::new(&conn);
        rx.insert(record)
    }
}

#[async_trait::async_trait]
impl RecordStore for SqliteStore {
    #[tracing::instrument(skip_all, fields(name=%filter.name, rtype=%filter.rtype), level = "debug")]
    async fn find_records(&self, filter: &RecordFilter) -> Result<RecordLookup, StoreError> {
        let conn = self.connection.lock().expect("connection poisoned");
        let rx = RecordPersistence::new(&conn);
        let rows = rx.find(filter)?;

        if rows.is_empty() {
            // A zero-row result is only "found, empty" when the name falls
            // under a namespace we actually serve; otherwise it is unknown
            // and the caller probes for a negative-answer SOA instead.
            let zx = ZonePersistence::new(&conn);
            if !zx.covers(&filter.name)? {
                tracing::debug!("name is outside every stored zone");
                return Ok(RecordLookup::NotFound);
            }
        }

        tracing::debug!("found {n} records", n = rows.len());
        Ok(RecordLookup::Rows(rows))
    }

    #[tracing::instrument(skip_all, fields(zone=%name), level = "debug")]
    async fn find_zone(&self, name: &str) -> Result<Option<ZoneRow>, StoreError> {
        let conn = self.connection.lock().expect("connection poisoned");
        let zx = ZonePersistence::new(&conn);
        Ok(zx.find(name)?)
    }

    #[tracing::instrument(skip_all, fields(zone=%zone, %qtype), level = "debug")]
    async fn find_wildcard_candidates(
        &self,
        zone: ZoneId,
        qtype: RecordType,
    ) -> Result<Vec<RecordRow>, StoreError> {
        let conn = self.connection.lock().expect("connection poisoned");
        let rx = RecordPersistence::new(&conn);
        let rows = rx.wildcards(zone, qtype)?;
        tracing::debug!("found {n} wildcard candidates", n = rows.len());
        Ok(rows)
    }
}

struct QueryBuilder<const N: usize> {
    table: &'static str,
    columns: [&'static str; N],
    primary: &'static str,
}

impl<const N: usize> QueryBuilder<N> {
    fn select(&self, filters: &str) -> String {
        let columns = self.columns.join(", ");
        format!(
            "SELECT {columns} FROM {table} {filters}",
            table = self.table
        )
    }

    fn insert(&self) -> String {
        // the primary key is assigned by the database
        let columns = self
            .columns
            .iter()
            .filter(|&&c| c != self.primary)
            .copied()
            .collect::<Vec<_>>();
        let params = columns
            .iter()
            .map(|c| format!(":{c}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "INSERT INTO {table} ({columns}) VALUES ({params})",
            table = self.table,
            columns = columns.join(", ")
        )
    }
}

#[derive(Debug, Clone)]
struct ZonePersistence<'c> {
    connection: &'c Connection,
}

impl<'c> ZonePersistence<'c> {
    fn new(connection: &'c Connection) -> Self {
        Self { connection }
    }

    const TABLE: QueryBuilder<4> = QueryBuilder {
        table: "zone",
        columns: ["id", "name", "master", "type"],
        primary: "id",
    };

    /// Find a single zone by apex name.
    #[tracing::instrument(skip_all, fields(zone=%name), level = "trace")]
    fn find(&self, name: &str) -> rusqlite::Result<Option<ZoneRow>> {
        let mut stmt = self
            .connection
            .prepare(&Self::TABLE.select("WHERE lower(name) = lower(:name) LIMIT 1"))?;
        let mut zones = stmt
            .query_map(named_params! { ":name": name }, ZoneRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(zones.pop())
    }

    /// Whether any stored zone's namespace covers this name (the name equals
    /// the zone apex or ends in `.<apex>`).
    #[tracing::instrument(skip_all, fields(%name), level = "trace")]
    fn covers(&self, name: &str) -> rusqlite::Result<bool> {
        let mut stmt = self.connection.prepare(&format!(
            "SELECT EXISTS (SELECT 1 FROM {table} WHERE lower(:name) = lower(name) \
             OR lower(:name) LIKE '%.' || lower(name))",
            table = Self::TABLE.table
        ))?;
        stmt.query_row(named_params! { ":name": name }, |row| row.get(0))
    }

    #[tracing::instrument(skip_all, fields(zone=%zone.name), level = "trace")]
    fn insert(&self, zone: &ZoneRow) -> rusqlite::Result<ZoneId> {
        let mut stmt = self.connection.prepare(&Self::TABLE.insert())?;
        stmt.execute(named_params! {
            ":name": zone.name,
            ":master": zone.master,
            ":type": zone.kind,
        })?;
        Ok(ZoneId::new(self.connection.last_insert_rowid()))
    }
}

impl FromRow for ZoneRow {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(ZoneRow {
            id: row.get("id")?,
            name: row.get("name")?,
            master: row.get("master")?,
            kind: row.get("type")?,
        })
    }
}

#[derive(Debug, Clone)]
struct RecordPersistence<'c> {
    connection: &'c Connection,
}

impl<'c> RecordPersistence<'c> {
    fn new(connection: &'c Connection) -> Self {
        Self { connection }
    }

    const TABLE: QueryBuilder<8> = QueryBuilder {
        table: "record",
        columns: [
            "id", "zone_id", "name", "type", "content", "ttl", "prio", "disabled",
        ],
        primary: "id",
    };

    /// Exact-match lookup: live rows at this name, optionally narrowed to a
    /// type tag (an empty tag matches every type).
    #[tracing::instrument(skip_all, fields(name=%filter.name), level = "trace")]
    fn find(&self, filter: &RecordFilter) -> rusqlite::Result<Vec<RecordRow>> {
        let mut stmt = self.connection.prepare(&Self::TABLE.select(
            "WHERE lower(name) = lower(:name) AND disabled = 0 \
             AND (:type = '' OR type = :type)",
        ))?;
        let rows = stmt
            .query_map(
                named_params! { ":name": filter.name, ":type": filter.rtype },
                RecordRow::from_row,
            )?
            .collect();
        rows
    }

    /// Candidate wildcard rows for a zone.
    ///
    /// Disabled rows are deliberately not filtered out here, matching the
    /// backend this emulates.
    #[tracing::instrument(skip_all, fields(zone=%zone), level = "trace")]
    fn wildcards(&self, zone: ZoneId, qtype: RecordType) -> rusqlite::Result<Vec<RecordRow>> {
        let mut stmt = self.connection.prepare(&Self::TABLE.select(
            "WHERE zone_id = :zone_id AND name LIKE '%*%' \
             AND (:type = 'ANY' OR type = :type)",
        ))?;
        let rows = stmt
            .query_map(
                named_params! { ":zone_id": zone, ":type": qtype.to_string() },
                RecordRow::from_row,
            )?
            .collect();
        rows
    }

    #[tracing::instrument(skip_all, fields(name=%record.name), level = "trace")]
    fn insert(&self, record: &RecordRow) -> rusqlite::Result<RecordId> {
        let mut stmt = self.connection.prepare(&Self::TABLE.insert())?;
        stmt.execute(named_params! {
            ":zone_id": record.zone_id,
            ":name": record.name,
            ":type": record.rtype,
            ":content": record.content,
            ":ttl": record.ttl,
            ":prio": record.priority,
            ":disabled": record.disabled,
        })?;
        Ok(RecordId::new(self.connection.last_insert_rowid()))
    }
}

impl FromRow for RecordRow {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(RecordRow {
            id: row.get("id")?,
            zone_id: row.get("zone_id")?,
            name: row.get("name")?,
            rtype: row.get("type")?,
            content: row.get("content")?,
            ttl: row.get("ttl")?,
            priority: row.get("prio")?,
            disabled: row.get("disabled")?,
        })
    }
}
