use crate::commentary::Commentator;
use crate::item::{ClothingItem, Condition, Rarity};
use crate::tiers::{brand_tier, BrandTier};
use crate::valuation::{value, Valuation};
use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Source name for records submitted through the API
pub const API_SOURCE: &str = "api";

/// Submitter recorded when a request names nobody
pub const ANONYMOUS: &str = "anonymous";

/// A stored valuation: the submitted item plus the price it was given
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ValuationRecord {
    /// Stable identity (UUID v4)
    pub id: String,

    /// Who submitted the item. Passed with each request, never remembered
    /// between requests.
    pub submitted_by: String,

    #[serde(flatten)]
    pub item: ClothingItem,

    pub current_price: f64,
    pub compound_rate: f64,

    /// Free text from the commentator (empty when disabled or failed)
    #[serde(default)]
    pub commentary: String,

    /// "api" or the CSV file the item was imported from
    pub source: String,

    /// 1-based data row for CSV imports, 0 for API submissions
    pub line_number: i64,

    pub created_at: DateTime<Utc>,
}

impl ValuationRecord {
    pub fn new(
        item: ClothingItem,
        submitted_by: &str,
        valuation: &Valuation,
        commentary: String,
        source: &str,
        line_number: i64,
    ) -> Self {
        let submitted_by = if submitted_by.trim().is_empty() {
            ANONYMOUS
        } else {
            submitted_by.trim()
        };

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            submitted_by: submitted_by.to_string(),
            item,
            current_price: valuation.current_price,
            compound_rate: valuation.compound_rate,
            commentary,
            source: source.to_string(),
            line_number,
            created_at: Utc::now(),
        }
    }

    /// Value an item, ask the commentator for text, and build the record.
    ///
    /// Commentary failures are logged and leave the commentary empty; they
    /// never block the valuation.
    pub fn appraise(
        item: ClothingItem,
        submitted_by: &str,
        commentator: &dyn Commentator,
        source: &str,
        line_number: i64,
    ) -> (Self, Valuation) {
        let valuation = value(&item);

        let commentary = match commentator.comment(&item, &valuation) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(brand = %item.brand, error = %e, "commentary failed");
                String::new()
            }
        };

        let record = Self::new(item, submitted_by, &valuation, commentary, source, line_number);
        (record, valuation)
    }

    /// Idempotency fingerprint.
    /// Imported rows hash source + row + attributes so re-importing a file is
    /// a no-op; API submissions hash their own id and are never deduplicated.
    pub fn compute_fingerprint(&self) -> String {
        let mut hasher = Sha256::new();

        if self.line_number > 0 {
            hasher.update(format!(
                "{}|{}|{}|{}|{}|{}|{}|{}|{}",
                self.source,
                self.line_number,
                self.item.initial_price,
                self.item.brand,
                self.item.category,
                self.item.condition,
                self.item.material,
                self.item.rarity,
                self.item.age_in_months,
            ));
        } else {
            hasher.update(format!("{}|{}", self.source, self.id));
        }

        format!("{:x}", hasher.finalize())
    }

    /// Share of the original price still retained
    pub fn retention(&self) -> f64 {
        if self.item.initial_price == 0.0 {
            return 0.0;
        }
        self.current_price / self.item.initial_price
    }
}

/// Audit trail entry
#[derive(Debug, Serialize, Clone)]
pub struct Event {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub entity_id: String,
    pub data: serde_json::Value,
    pub actor: String,
}

impl Event {
    pub fn new(event_type: &str, entity_id: &str, data: serde_json::Value, actor: &str) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type: event_type.to_string(),
            entity_id: entity_id.to_string(),
            data,
            actor: actor.to_string(),
        }
    }
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // WAL for crash recovery; in-memory databases report "memory" and that's fine
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // ==========================================================================
    // Valuations Table
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS valuations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            record_uuid TEXT UNIQUE NOT NULL,
            fingerprint TEXT UNIQUE NOT NULL,
            submitted_by TEXT NOT NULL,
            initial_price REAL NOT NULL,
            brand TEXT NOT NULL,
            category TEXT NOT NULL,
            condition TEXT NOT NULL,
            material TEXT NOT NULL,
            rarity TEXT NOT NULL,
            age_in_months INTEGER NOT NULL,
            current_price REAL NOT NULL,
            compound_rate REAL NOT NULL,
            commentary TEXT NOT NULL DEFAULT '',
            source TEXT NOT NULL,
            line_number INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Events Table (audit trail)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            timestamp TEXT NOT NULL,
            event_type TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            data TEXT NOT NULL,
            actor TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_valuations_brand ON valuations(brand)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_valuations_created_at ON valuations(created_at)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_entity ON events(entity_id)",
        [],
    )?;

    Ok(())
}

/// Open (or create) the database file and make sure the schema exists
pub fn open_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database: {:?}", path))?;
    setup_database(&conn).context("Failed to set up database schema")?;
    Ok(conn)
}

/// Read clothing items from a CSV file with a header row.
/// Extra columns (colour, size, ...) are ignored.
pub fn load_csv(csv_path: &Path) -> Result<Vec<ClothingItem>> {
    let mut rdr = csv::Reader::from_path(csv_path)
        .with_context(|| format!("Failed to open CSV file: {:?}", csv_path))?;

    let mut items = Vec::new();

    for (index, result) in rdr.deserialize().enumerate() {
        let item: ClothingItem = result
            .with_context(|| format!("Failed to deserialize item at row {}", index + 1))?;
        items.push(item);
    }

    Ok(items)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub total: usize,
    pub inserted: usize,
    pub duplicates: usize,
}

/// Value and store every item. Rows already imported from the same source
/// are counted as duplicates.
pub fn import_items(
    conn: &Connection,
    items: &[ClothingItem],
    source: &str,
    submitted_by: &str,
    commentator: &dyn Commentator,
) -> Result<ImportSummary> {
    let mut summary = ImportSummary {
        total: items.len(),
        ..Default::default()
    };

    for (index, item) in items.iter().enumerate() {
        let (record, _) = ValuationRecord::appraise(
            item.clone(),
            submitted_by,
            commentator,
            source,
            index as i64 + 1,
        );

        if insert_record(conn, &record)? {
            summary.inserted += 1;
        } else {
            summary.duplicates += 1;
        }
    }

    tracing::info!(
        source,
        inserted = summary.inserted,
        duplicates = summary.duplicates,
        "import finished"
    );

    Ok(summary)
}

/// Insert one record. Returns false when its fingerprint already exists.
pub fn insert_record(conn: &Connection, record: &ValuationRecord) -> Result<bool> {
    let fingerprint = record.compute_fingerprint();

    let result = conn.execute(
        "INSERT INTO valuations (
            record_uuid, fingerprint, submitted_by,
            initial_price, brand, category, condition, material, rarity, age_in_months,
            current_price, compound_rate, commentary, source, line_number, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        params![
            record.id,
            fingerprint,
            record.submitted_by,
            record.item.initial_price,
            record.item.brand,
            record.item.category,
            record.item.condition.as_str(),
            record.item.material,
            record.item.rarity.as_str(),
            record.item.age_in_months,
            record.current_price,
            record.compound_rate,
            record.commentary,
            record.source,
            record.line_number,
            record.created_at.to_rfc3339_opts(SecondsFormat::Nanos, true),
        ],
    );

    match result {
        Ok(_) => {
            let event = Event::new(
                "valuation_recorded",
                &record.id,
                serde_json::json!({
                    "brand": record.item.brand,
                    "initial_price": record.item.initial_price,
                    "current_price": record.current_price,
                    "source": record.source,
                }),
                &record.submitted_by,
            );
            if let Err(e) = insert_event(conn, &event) {
                tracing::warn!(record = %record.id, error = %e, "failed to write audit event");
            }
            Ok(true)
        }
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            tracing::debug!(record = %record.id, "duplicate fingerprint skipped");
            Ok(false)
        }
        Err(e) => Err(e).context("Failed to insert valuation record"),
    }
}

/// Insert event into audit trail
pub fn insert_event(conn: &Connection, event: &Event) -> Result<()> {
    let data_json = serde_json::to_string(&event.data)?;

    conn.execute(
        "INSERT INTO events (event_id, timestamp, event_type, entity_id, data, actor)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            event.event_id,
            event.timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true),
            event.event_type,
            event.entity_id,
            data_json,
            event.actor,
        ],
    )?;

    Ok(())
}

/// Get audit events for one record, newest first
pub fn get_events_for_record(conn: &Connection, record_id: &str) -> Result<Vec<Event>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, timestamp, event_type, entity_id, data, actor
         FROM events
         WHERE entity_id = ?1
         ORDER BY timestamp DESC",
    )?;

    let events = stmt
        .query_map(params![record_id], |row| {
            let data_json: String = row.get(4)?;

            Ok(Event {
                event_id: row.get(0)?,
                timestamp: parse_timestamp(row, 1)?,
                event_type: row.get(2)?,
                entity_id: row.get(3)?,
                data: serde_json::from_str(&data_json)
                    .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?,
                actor: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(events)
}

const RECORD_COLUMNS: &str = "record_uuid, submitted_by,
    initial_price, brand, category, condition, material, rarity, age_in_months,
    current_price, compound_rate, commentary, source, line_number, created_at";

fn parse_timestamp(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn row_to_record(row: &Row) -> rusqlite::Result<ValuationRecord> {
    let condition: String = row.get(5)?;
    let rarity: String = row.get(7)?;

    Ok(ValuationRecord {
        id: row.get(0)?,
        submitted_by: row.get(1)?,
        item: ClothingItem {
            initial_price: row.get(2)?,
            brand: row.get(3)?,
            category: row.get(4)?,
            condition: Condition::parse(&condition),
            material: row.get(6)?,
            rarity: Rarity::parse(&rarity),
            age_in_months: row.get(8)?,
        },
        current_price: row.get(9)?,
        compound_rate: row.get(10)?,
        commentary: row.get(11)?,
        source: row.get(12)?,
        line_number: row.get(13)?,
        created_at: parse_timestamp(row, 14)?,
    })
}

/// All records, newest first
pub fn get_all_records(conn: &Connection) -> Result<Vec<ValuationRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM valuations ORDER BY created_at DESC, id DESC",
        RECORD_COLUMNS
    ))?;

    let records = stmt
        .query_map([], row_to_record)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(records)
}

pub fn get_record(conn: &Connection, id: &str) -> Result<Option<ValuationRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM valuations WHERE record_uuid = ?1",
        RECORD_COLUMNS
    ))?;

    let mut rows = stmt.query_map([id], row_to_record)?;
    match rows.next() {
        Some(record) => Ok(Some(record?)),
        None => Ok(None),
    }
}

/// Records for one brand (exact match), newest first
pub fn get_records_by_brand(conn: &Connection, brand: &str) -> Result<Vec<ValuationRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM valuations WHERE brand = ?1 ORDER BY created_at DESC, id DESC",
        RECORD_COLUMNS
    ))?;

    let records = stmt
        .query_map([brand], row_to_record)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(records)
}

pub fn verify_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM valuations", [], |row| row.get(0))?;

    Ok(count)
}

/// Per-brand statistics
#[derive(Debug, Clone, Serialize)]
pub struct BrandStat {
    pub brand: String,
    pub tier: Option<BrandTier>,
    pub count: i64,
    pub avg_initial_price: f64,
    pub avg_current_price: f64,
    /// Mean of current / initial over items with a positive initial price
    pub avg_retention: f64,
}

/// Statistics grouped by brand, most submitted first
pub fn get_brand_stats(conn: &Connection) -> Result<Vec<BrandStat>> {
    let mut stmt = conn.prepare(
        "SELECT
            brand,
            COUNT(*) as count,
            AVG(initial_price) as avg_initial,
            AVG(current_price) as avg_current,
            AVG(CASE WHEN initial_price > 0 THEN current_price / initial_price END) as avg_retention
         FROM valuations
         GROUP BY brand
         ORDER BY count DESC, brand ASC",
    )?;

    let stats = stmt
        .query_map([], |row| {
            let brand: String = row.get(0)?;
            let avg_retention: Option<f64> = row.get(4)?;

            Ok(BrandStat {
                tier: brand_tier(&brand),
                brand,
                count: row.get(1)?,
                avg_initial_price: row.get(2)?,
                avg_current_price: row.get(3)?,
                avg_retention: avg_retention.unwrap_or(0.0),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(stats)
}
