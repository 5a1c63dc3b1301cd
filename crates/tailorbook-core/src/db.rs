// SQLite persistence layer for customers, the reference catalog, and
// measurement values.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use tracing::debug;

use crate::catalog::Catalog;
use crate::error::{StoreError, StoreResult};
use crate::model::{
    ClothingType, Customer, MeasurementDefinition, MeasurementInput, MeasurementReading,
    Overview, SaveSummary,
};

/// Rows added by [`Database::seed_catalog`]. Rows that already existed are
/// not counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub measurements: usize,
    pub clothing_types: usize,
    pub templates: usize,
}

/// SQLite-backed store for the shop's customers and their measurements.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database (useful
    /// for tests).
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS customers (
                id   INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE CHECK (length(trim(name)) > 0)
            );

            CREATE TABLE IF NOT EXISTS clothing_type (
                id   INTEGER PRIMARY KEY,
                name TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS measurements_list (
                id   INTEGER PRIMARY KEY,
                name TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS clothing_measurements (
                clothing_type_id INTEGER NOT NULL REFERENCES clothing_type(id) ON DELETE CASCADE,
                measurement_id   INTEGER NOT NULL REFERENCES measurements_list(id) ON DELETE CASCADE,
                position         INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (clothing_type_id, measurement_id)
            );

            CREATE TABLE IF NOT EXISTS measurements (
                id               INTEGER PRIMARY KEY AUTOINCREMENT,
                customer_id      INTEGER NOT NULL REFERENCES customers(id) ON DELETE CASCADE,
                clothing_type_id INTEGER NOT NULL,
                measurement_id   INTEGER NOT NULL,
                value            REAL,
                UNIQUE (customer_id, clothing_type_id, measurement_id),
                FOREIGN KEY (clothing_type_id, measurement_id)
                    REFERENCES clothing_measurements(clothing_type_id, measurement_id)
                    ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_measurements_customer
                ON measurements(customer_id, clothing_type_id);
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection. A poisoned lock is recovered: every
    /// write runs in its own statement or transaction, so a panicking holder
    /// cannot leave half-applied state behind.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ------------------------------------------------------------------
    // Reference catalog
    // ------------------------------------------------------------------

    /// Insert the catalog's measurement definitions, clothing types and
    /// templates in a single transaction. Existing rows are left untouched
    /// (INSERT OR IGNORE), so hand-edited names survive a re-seed.
    pub fn seed_catalog(&self, catalog: &Catalog) -> Result<SeedReport> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin seed transaction")?;
        let mut report = SeedReport::default();

        for m in &catalog.measurements {
            report.measurements += tx
                .execute(
                    "INSERT OR IGNORE INTO measurements_list (id, name) VALUES (?1, ?2)",
                    params![m.id, m.name],
                )
                .context("failed to seed measurement definition")?;
        }

        for t in &catalog.clothing_types {
            report.clothing_types += tx
                .execute(
                    "INSERT OR IGNORE INTO clothing_type (id, name) VALUES (?1, ?2)",
                    params![t.id, t.name],
                )
                .context("failed to seed clothing type")?;

            for (position, measurement_id) in t.measurements.iter().enumerate() {
                report.templates += tx
                    .execute(
                        "INSERT OR IGNORE INTO clothing_measurements
                            (clothing_type_id, measurement_id, position)
                         VALUES (?1, ?2, ?3)",
                        params![t.id, measurement_id, position as i64],
                    )
                    .context("failed to seed clothing measurement template")?;
            }
        }

        tx.commit().context("failed to commit catalog seed")?;
        Ok(report)
    }

    /// All clothing types, ordered by id, capped at `limit` rows.
    pub fn list_clothing_types(&self, limit: usize) -> StoreResult<Vec<ClothingType>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT id, name FROM clothing_type ORDER BY id LIMIT ?1")?;
        let types = stmt
            .query_map(params![limit as i64], |row| {
                Ok(ClothingType {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(types)
    }

    /// The measurement definitions templated for `clothing_type_id`, in
    /// template order. Unknown clothing types have an empty template.
    pub fn measurement_template(
        &self,
        clothing_type_id: i64,
    ) -> StoreResult<Vec<MeasurementDefinition>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT ml.id, ml.name
             FROM clothing_measurements cm
             JOIN measurements_list ml ON ml.id = cm.measurement_id
             WHERE cm.clothing_type_id = ?1
             ORDER BY cm.position, cm.measurement_id",
        )?;
        let defs = stmt
            .query_map(params![clothing_type_id], |row| {
                Ok(MeasurementDefinition {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(defs)
    }

    // ------------------------------------------------------------------
    // Customers
    // ------------------------------------------------------------------

    /// Register a customer and return the generated id.
    ///
    /// The name is trimmed. Blank names are rejected, and so is a name that
    /// exactly matches (case-sensitive) an existing customer. The duplicate
    /// check is the table's UNIQUE constraint, so two concurrent adds of the
    /// same name cannot both succeed.
    pub fn add_customer(&self, name: &str) -> StoreResult<i64> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::Validation("Customer name is required".into()));
        }

        let conn = self.conn();
        let inserted = conn.query_row(
            "INSERT INTO customers (name) VALUES (?1) RETURNING id",
            params![name],
            |row| row.get(0),
        );
        match inserted {
            Ok(id) => Ok(id),
            Err(e) if StoreError::is_unique_violation(&e) => Err(StoreError::Duplicate {
                name: name.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a customer together with every stored measurement value, for
    /// all clothing types. Returns how many measurement values were removed.
    pub fn delete_customer(&self, customer_id: i64) -> StoreResult<usize> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let removed = tx.execute(
            "DELETE FROM measurements WHERE customer_id = ?1",
            params![customer_id],
        )?;
        let deleted = tx.execute("DELETE FROM customers WHERE id = ?1", params![customer_id])?;
        if deleted == 0 {
            // Dropping `tx` rolls back.
            return Err(StoreError::NotFound(format!(
                "customer {customer_id} not found"
            )));
        }

        tx.commit()?;
        Ok(removed)
    }

    /// Every customer, ordered by id.
    pub fn list_customers(&self) -> StoreResult<Vec<Customer>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT id, name FROM customers ORDER BY id")?;
        let customers = stmt
            .query_map([], |row| {
                Ok(Customer {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(customers)
    }

    /// All customers plus the first `clothing_type_limit` clothing types.
    pub fn list_overview(&self, clothing_type_limit: usize) -> StoreResult<Overview> {
        Ok(Overview {
            customers: self.list_customers()?,
            clothing_types: self.list_clothing_types(clothing_type_limit)?,
        })
    }

    // ------------------------------------------------------------------
    // Measurements
    // ------------------------------------------------------------------

    /// The clothing type's full template, in template order, with the
    /// customer's stored values overlaid. Template entries without a stored
    /// value come back as `None`.
    pub fn get_measurements(
        &self,
        customer_id: i64,
        clothing_type_id: i64,
    ) -> StoreResult<Vec<MeasurementReading>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT ml.id, ml.name, m.value
             FROM clothing_measurements cm
             JOIN measurements_list ml ON ml.id = cm.measurement_id
             LEFT JOIN measurements m
                    ON m.measurement_id   = cm.measurement_id
                   AND m.clothing_type_id = cm.clothing_type_id
                   AND m.customer_id      = ?1
             WHERE cm.clothing_type_id = ?2
             ORDER BY cm.position, cm.measurement_id",
        )?;
        let readings = stmt
            .query_map(params![customer_id, clothing_type_id], |row| {
                Ok(MeasurementReading {
                    measurement_id: row.get(0)?,
                    name: row.get(1)?,
                    value: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(readings)
    }

    /// Upsert a batch of measurement values for one customer and clothing
    /// type.
    ///
    /// Entries whose measurement is not templated for the clothing type are
    /// skipped. Every upsert of the batch runs in one transaction, so a
    /// failure leaves the stored values exactly as they were.
    pub fn save_measurements(
        &self,
        customer_id: i64,
        clothing_type_id: i64,
        entries: &[MeasurementInput],
    ) -> StoreResult<SaveSummary> {
        if let Some(bad) = entries
            .iter()
            .find(|e| e.value.is_some_and(|v| !v.is_finite()))
        {
            return Err(StoreError::Validation(format!(
                "measurement {} must be a finite number",
                bad.measurement_id
            )));
        }

        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM customers WHERE id = ?1)",
            params![customer_id],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(StoreError::NotFound(format!(
                "customer {customer_id} not found"
            )));
        }

        let mut summary = SaveSummary::default();
        {
            let mut template_stmt = tx.prepare(
                "SELECT measurement_id FROM clothing_measurements WHERE clothing_type_id = ?1",
            )?;
            let templated: HashSet<i64> = template_stmt
                .query_map(params![clothing_type_id], |row| row.get(0))?
                .collect::<std::result::Result<_, _>>()?;

            let mut upsert = tx.prepare(
                "INSERT INTO measurements (customer_id, clothing_type_id, measurement_id, value)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(customer_id, clothing_type_id, measurement_id)
                 DO UPDATE SET value = excluded.value",
            )?;

            for entry in entries {
                if !templated.contains(&entry.measurement_id) {
                    debug!(
                        customer_id,
                        clothing_type_id,
                        measurement_id = entry.measurement_id,
                        "skipping measurement not templated for clothing type"
                    );
                    summary.skipped += 1;
                    continue;
                }
                upsert.execute(params![
                    customer_id,
                    clothing_type_id,
                    entry.measurement_id,
                    entry.value
                ])?;
                summary.saved += 1;
            }
        }

        tx.commit()?;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ClothingTypeEntry, MeasurementEntry};

    const COAT: i64 = 1;
    const MANTEAU: i64 = 2;

    /// Helper: create a fresh in-memory database for each test.
    fn test_db() -> Database {
        Database::open(":memory:").expect("in-memory database should open")
    }

    /// Small catalog: coat templates 1-3, manteau templates 1, 4 and 2 in
    /// that order, skirt has no template yet.
    fn sample_catalog() -> Catalog {
        let measurement = |id: i64, name: &str| MeasurementEntry {
            id,
            name: name.to_string(),
        };
        let clothing = |id: i64, name: &str, measurements: Vec<i64>| ClothingTypeEntry {
            id,
            name: name.to_string(),
            measurements,
        };
        Catalog {
            measurements: vec![
                measurement(1, "Neck circumference"),
                measurement(2, "Shoulder width"),
                measurement(3, "Chest circumference"),
                measurement(4, "Manteau length"),
            ],
            clothing_types: vec![
                clothing(COAT, "Coat", vec![1, 2, 3]),
                clothing(MANTEAU, "Manteau", vec![1, 4, 2]),
                clothing(3, "Skirt", vec![]),
            ],
        }
    }

    fn seeded_db() -> Database {
        let db = test_db();
        db.seed_catalog(&sample_catalog()).unwrap();
        db
    }

    fn input(measurement_id: i64, value: Option<f64>) -> MeasurementInput {
        MeasurementInput {
            measurement_id,
            value,
        }
    }

    fn count_values(db: &Database, customer_id: i64) -> i64 {
        db.conn()
            .query_row(
                "SELECT COUNT(*) FROM measurements WHERE customer_id = ?1",
                params![customer_id],
                |row| row.get(0),
            )
            .unwrap()
    }

    // ------------------------------------------------------------------
    // Schema / open
    // ------------------------------------------------------------------

    #[test]
    fn open_creates_tables() {
        let db = test_db();
        let conn = db.conn();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        for table in [
            "customers",
            "clothing_type",
            "measurements_list",
            "clothing_measurements",
            "measurements",
        ] {
            assert!(tables.contains(&table.to_string()), "missing table {table}");
        }
    }

    #[test]
    fn reopening_file_database_keeps_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shop.db");
        let path = path.to_str().unwrap();

        {
            let db = Database::open(path).unwrap();
            db.add_customer("Ali").unwrap();
        }

        let db = Database::open(path).expect("schema creation should be idempotent");
        let customers = db.list_customers().unwrap();
        assert_eq!(customers.len(), 1);
        assert_eq!(customers[0].name, "Ali");
    }

    // ------------------------------------------------------------------
    // Catalog seeding
    // ------------------------------------------------------------------

    #[test]
    fn seed_catalog_reports_inserted_rows() {
        let db = test_db();
        let report = db.seed_catalog(&sample_catalog()).unwrap();
        assert_eq!(
            report,
            SeedReport {
                measurements: 4,
                clothing_types: 3,
                templates: 6,
            }
        );
    }

    #[test]
    fn seed_catalog_is_idempotent_and_keeps_edits() {
        let db = seeded_db();
        db.conn()
            .execute(
                "UPDATE measurements_list SET name = 'Neck' WHERE id = 1",
                [],
            )
            .unwrap();

        let report = db.seed_catalog(&sample_catalog()).unwrap();
        assert_eq!(report, SeedReport::default());

        let template = db.measurement_template(COAT).unwrap();
        assert_eq!(template[0].name, "Neck");
    }

    #[test]
    fn template_follows_catalog_order() {
        let db = seeded_db();
        let ids: Vec<i64> = db
            .measurement_template(MANTEAU)
            .unwrap()
            .iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec![1, 4, 2]);
    }

    #[test]
    fn list_clothing_types_honors_limit() {
        let db = seeded_db();
        let types = db.list_clothing_types(2).unwrap();
        assert_eq!(types.len(), 2);
        assert_eq!(types[0].name, "Coat");
        assert_eq!(types[1].name, "Manteau");

        assert_eq!(db.list_clothing_types(6).unwrap().len(), 3);
    }

    // ------------------------------------------------------------------
    // Customers
    // ------------------------------------------------------------------

    #[test]
    fn add_customer_returns_generated_ids() {
        let db = test_db();
        let ali = db.add_customer("Ali").unwrap();
        let sara = db.add_customer("Sara").unwrap();
        assert_eq!(ali, 1);
        assert_eq!(sara, 2);
    }

    #[test]
    fn add_customer_trims_name() {
        let db = test_db();
        db.add_customer("  Maryam  ").unwrap();
        assert_eq!(db.list_customers().unwrap()[0].name, "Maryam");
    }

    #[test]
    fn add_customer_rejects_blank_names() {
        let db = test_db();
        for name in ["", "   ", "\t\n"] {
            let err = db.add_customer(name).unwrap_err();
            assert!(matches!(err, StoreError::Validation(_)), "{name:?}: {err}");
        }
        assert!(db.list_customers().unwrap().is_empty());
    }

    #[test]
    fn add_customer_rejects_exact_duplicate() {
        let db = test_db();
        db.add_customer("Ali").unwrap();

        let err = db.add_customer("Ali").unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { ref name } if name == "Ali"));

        // Trimming happens before the uniqueness check.
        let err = db.add_customer(" Ali ").unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { .. }));

        assert_eq!(db.list_customers().unwrap().len(), 1);
    }

    #[test]
    fn duplicate_check_is_case_sensitive() {
        let db = test_db();
        db.add_customer("Ali").unwrap();
        db.add_customer("ali").unwrap();
        assert_eq!(db.list_customers().unwrap().len(), 2);
    }

    #[test]
    fn list_overview_combines_customers_and_types() {
        let db = seeded_db();
        db.add_customer("Ali").unwrap();
        db.add_customer("Sara").unwrap();

        let overview = db.list_overview(6).unwrap();
        let names: Vec<&str> = overview.customers.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Ali", "Sara"]);
        assert_eq!(overview.clothing_types.len(), 3);
    }

    #[test]
    fn delete_customer_removes_values_for_every_clothing_type() {
        let db = seeded_db();
        let ali = db.add_customer("Ali").unwrap();
        let sara = db.add_customer("Sara").unwrap();

        db.save_measurements(ali, COAT, &[input(1, Some(38.0)), input(2, Some(44.0))])
            .unwrap();
        db.save_measurements(ali, MANTEAU, &[input(4, Some(95.0))])
            .unwrap();
        db.save_measurements(sara, COAT, &[input(1, Some(34.0))])
            .unwrap();

        let removed = db.delete_customer(ali).unwrap();
        assert_eq!(removed, 3);
        assert_eq!(count_values(&db, ali), 0);
        let remaining: Vec<i64> = db.list_customers().unwrap().iter().map(|c| c.id).collect();
        assert_eq!(remaining, vec![sara]);

        // Other customers are untouched.
        assert_eq!(count_values(&db, sara), 1);
    }

    #[test]
    fn delete_unknown_customer_is_not_found() {
        let db = test_db();
        let err = db.delete_customer(42).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    // ------------------------------------------------------------------
    // Measurements
    // ------------------------------------------------------------------

    #[test]
    fn get_measurements_defaults_to_empty_values() {
        let db = seeded_db();
        let ali = db.add_customer("Ali").unwrap();

        let readings = db.get_measurements(ali, COAT).unwrap();
        assert_eq!(readings.len(), 3);
        assert!(readings.iter().all(|r| r.value.is_none()));
        assert_eq!(readings[2].name, "Chest circumference");
    }

    #[test]
    fn save_then_get_overlays_stored_values() {
        let db = seeded_db();
        let ali = db.add_customer("Ali").unwrap();

        let summary = db
            .save_measurements(ali, MANTEAU, &[input(1, Some(38.0))])
            .unwrap();
        assert_eq!(summary, SaveSummary { saved: 1, skipped: 0 });

        let readings = db.get_measurements(ali, MANTEAU).unwrap();
        let ids: Vec<i64> = readings.iter().map(|r| r.measurement_id).collect();
        assert_eq!(ids, vec![1, 4, 2]);
        assert_eq!(readings[0].value, Some(38.0));
        assert_eq!(readings[1].value, None);
        assert_eq!(readings[2].value, None);

        // Values are scoped to the clothing type they were saved under.
        assert!(db
            .get_measurements(ali, COAT)
            .unwrap()
            .iter()
            .all(|r| r.value.is_none()));
    }

    #[test]
    fn save_updates_existing_value_in_place() {
        let db = seeded_db();
        let ali = db.add_customer("Ali").unwrap();

        db.save_measurements(ali, COAT, &[input(2, Some(44.0))]).unwrap();
        db.save_measurements(ali, COAT, &[input(2, Some(45.5))]).unwrap();

        assert_eq!(count_values(&db, ali), 1);
        let readings = db.get_measurements(ali, COAT).unwrap();
        assert_eq!(readings[1].value, Some(45.5));
    }

    #[test]
    fn save_with_none_clears_value() {
        let db = seeded_db();
        let ali = db.add_customer("Ali").unwrap();

        db.save_measurements(ali, COAT, &[input(3, Some(92.0))]).unwrap();
        db.save_measurements(ali, COAT, &[input(3, None)]).unwrap();

        let readings = db.get_measurements(ali, COAT).unwrap();
        assert_eq!(readings[2].value, None);
        assert_eq!(count_values(&db, ali), 1);
    }

    #[test]
    fn save_skips_measurements_not_in_template() {
        let db = seeded_db();
        let ali = db.add_customer("Ali").unwrap();

        // Measurement 4 belongs to the manteau template only; 99 does not exist.
        let summary = db
            .save_measurements(
                ali,
                COAT,
                &[input(4, Some(95.0)), input(1, Some(38.0)), input(99, Some(1.0))],
            )
            .unwrap();
        assert_eq!(summary, SaveSummary { saved: 1, skipped: 2 });
        assert_eq!(count_values(&db, ali), 1);
    }

    #[test]
    fn save_for_unknown_clothing_type_skips_everything() {
        let db = seeded_db();
        let ali = db.add_customer("Ali").unwrap();

        let summary = db
            .save_measurements(ali, 77, &[input(1, Some(38.0))])
            .unwrap();
        assert_eq!(summary, SaveSummary { saved: 0, skipped: 1 });
        assert!(db.get_measurements(ali, 77).unwrap().is_empty());
    }

    #[test]
    fn save_for_unknown_customer_is_not_found() {
        let db = seeded_db();
        let err = db
            .save_measurements(5, COAT, &[input(1, Some(38.0))])
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn save_stores_negative_values_as_given() {
        let db = seeded_db();
        let ali = db.add_customer("Ali").unwrap();

        let summary = db
            .save_measurements(ali, COAT, &[input(1, Some(-2.5))])
            .unwrap();
        assert_eq!(summary, SaveSummary { saved: 1, skipped: 0 });
        assert_eq!(db.get_measurements(ali, COAT).unwrap()[0].value, Some(-2.5));
    }

    #[test]
    fn save_rejects_non_finite_values_before_writing() {
        let db = seeded_db();
        let ali = db.add_customer("Ali").unwrap();

        let err = db
            .save_measurements(ali, COAT, &[input(1, Some(38.0)), input(2, Some(f64::NAN))])
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(count_values(&db, ali), 0);
    }

    #[test]
    fn failed_batch_rolls_back_earlier_upserts() {
        let db = seeded_db();
        let ali = db.add_customer("Ali").unwrap();
        db.save_measurements(ali, COAT, &[input(1, Some(38.0))]).unwrap();

        // Make the third measurement fail at the storage layer.
        db.conn()
            .execute_batch(
                "CREATE TRIGGER fail_chest BEFORE INSERT ON measurements
                 WHEN NEW.measurement_id = 3
                 BEGIN SELECT RAISE(ABORT, 'chest is broken'); END;",
            )
            .unwrap();

        let err = db
            .save_measurements(
                ali,
                COAT,
                &[input(1, Some(40.0)), input(2, Some(44.0)), input(3, Some(92.0))],
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::Sqlite(_)));

        let readings = db.get_measurements(ali, COAT).unwrap();
        assert_eq!(readings[0].value, Some(38.0), "update must be rolled back");
        assert_eq!(readings[1].value, None, "insert must be rolled back");
        assert_eq!(count_values(&db, ali), 1);
    }

    #[test]
    fn stored_values_must_be_templated() {
        // The write path filters, and the schema refuses anything that slips by.
        let db = seeded_db();
        let ali = db.add_customer("Ali").unwrap();
        let result = db.conn().execute(
            "INSERT INTO measurements (customer_id, clothing_type_id, measurement_id, value)
             VALUES (?1, ?2, 4, 1.0)",
            params![ali, COAT],
        );
        assert!(result.is_err());
    }
}
