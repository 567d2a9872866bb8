//! The persistence boundary: a shared SQLite handle behind a small
//! select/insert/update surface.
//!
//! Every field and predicate column is validated against the schema
//! registry before any SQL is built, so identifiers never come from
//! callers unchecked and a field the schema doesn't declare is an
//! [`StoreError::UnknownField`], not a silent new column.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use itertools::Itertools;
use rusqlite::types::{ToSqlOutput, Value as SqlValue, ValueRef};
use rusqlite::{Connection, ToSql, ffi};

use crate::{StoreError, schema};

/// One typed cell. The schema only uses integer, real, and text affinities;
/// booleans are stored as 0/1 integers.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl FieldValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Real(r) => Some(*r),
            FieldValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl ToSql for FieldValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            FieldValue::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            FieldValue::Integer(i) => ToSqlOutput::Borrowed(ValueRef::Integer(*i)),
            FieldValue::Real(r) => ToSqlOutput::Borrowed(ValueRef::Real(*r)),
            FieldValue::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Real(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Integer(v as i64)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => FieldValue::Null,
        }
    }
}

impl From<SqlValue> for FieldValue {
    fn from(v: SqlValue) -> Self {
        match v {
            SqlValue::Null => FieldValue::Null,
            SqlValue::Integer(i) => FieldValue::Integer(i),
            SqlValue::Real(r) => FieldValue::Real(r),
            SqlValue::Text(s) => FieldValue::Text(s),
            // No blob columns exist in this schema.
            SqlValue::Blob(_) => FieldValue::Null,
        }
    }
}

/// One result row, column name to value.
pub type Row = HashMap<String, FieldValue>;

/// Named fields for an insert or update, in statement order.
pub type FieldMap = Vec<(&'static str, FieldValue)>;

/// Equality predicate over one or more columns, ANDed together.
pub type Predicate<'a> = &'a [(&'a str, FieldValue)];

pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Opens (creating if needed) the database at `path` and brings the
    /// schema up to date.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        let created = schema::ensure_schema(&conn)?;
        if !created.is_empty() {
            log::info!("Created tables: {}", created.iter().join(", "));
        }
        Ok(Store {
            conn: Mutex::new(conn),
        })
    }

    /// Rows matching `predicate`, restricted to `columns` (all registry
    /// columns when empty).
    pub fn select(
        &self,
        table: &str,
        columns: &[&str],
        predicate: Predicate,
    ) -> Result<Vec<Row>, StoreError> {
        let registry = self.registry(table)?;
        let columns: Vec<&str> = if columns.is_empty() {
            registry.to_vec()
        } else {
            columns.to_vec()
        };
        for col in &columns {
            self.check_field(table, registry, col)?;
        }
        for (col, _) in predicate {
            self.check_field(table, registry, col)?;
        }

        let mut sql = format!("SELECT {} FROM {table}", columns.iter().join(", "));
        push_where(&mut sql, predicate);

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(&sql)?;
        let params: Vec<&dyn ToSql> = predicate.iter().map(|(_, v)| v as &dyn ToSql).collect();

        let rows = stmt.query_map(params.as_slice(), |row| {
            let mut out = Row::with_capacity(columns.len());
            for (i, col) in columns.iter().enumerate() {
                let value: SqlValue = row.get(i)?;
                out.insert(col.to_string(), value.into());
            }
            Ok(out)
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Inserts one row. A primary-key or uniqueness conflict surfaces as
    /// [`StoreError::Duplicate`].
    pub fn insert(&self, table: &str, fields: &FieldMap) -> Result<(), StoreError> {
        let registry = self.registry(table)?;
        for (col, _) in fields {
            self.check_field(table, registry, col)?;
        }

        let sql = format!(
            "INSERT INTO {table} ({}) VALUES ({})",
            fields.iter().map(|(col, _)| *col).join(", "),
            (1..=fields.len()).map(|i| format!("?{i}")).join(", "),
        );

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(&sql)?;
        let params: Vec<&dyn ToSql> = fields.iter().map(|(_, v)| v as &dyn ToSql).collect();
        match stmt.execute(params.as_slice()) {
            Ok(_) => Ok(()),
            Err(err) if is_duplicate_key(&err) => Err(StoreError::Duplicate {
                table: table.to_string(),
            }),
            Err(err) => Err(err.into()),
        }
    }

    /// Inserts one row, treating a duplicate as "already present". Returns
    /// whether a row was actually written.
    pub fn insert_or_skip(&self, table: &str, fields: &FieldMap) -> Result<bool, StoreError> {
        match self.insert(table, fields) {
            Ok(()) => Ok(true),
            Err(StoreError::Duplicate { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Updates all rows matching `predicate`, returning the count touched.
    pub fn update(
        &self,
        table: &str,
        fields: &FieldMap,
        predicate: Predicate,
    ) -> Result<usize, StoreError> {
        let registry = self.registry(table)?;
        for (col, _) in fields {
            self.check_field(table, registry, col)?;
        }
        for (col, _) in predicate {
            self.check_field(table, registry, col)?;
        }

        let mut sql = format!(
            "UPDATE {table} SET {}",
            fields
                .iter()
                .enumerate()
                .map(|(i, (col, _))| format!("{col} = ?{}", i + 1))
                .join(", "),
        );
        push_where_offset(&mut sql, predicate, fields.len());

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(&sql)?;
        let params: Vec<&dyn ToSql> = fields
            .iter()
            .map(|(_, v)| v as &dyn ToSql)
            .chain(predicate.iter().map(|(_, v)| v as &dyn ToSql))
            .collect();
        Ok(stmt.execute(params.as_slice())?)
    }

    fn registry(&self, table: &str) -> Result<&'static [&'static str], StoreError> {
        schema::columns(table).ok_or_else(|| StoreError::UnknownTable(table.to_string()))
    }

    fn check_field(
        &self,
        table: &str,
        registry: &'static [&'static str],
        field: &str,
    ) -> Result<(), StoreError> {
        if registry.contains(&field) {
            Ok(())
        } else {
            Err(StoreError::UnknownField {
                table: table.to_string(),
                field: field.to_string(),
            })
        }
    }
}

fn push_where(sql: &mut String, predicate: Predicate) {
    push_where_offset(sql, predicate, 0);
}

fn push_where_offset(sql: &mut String, predicate: Predicate, offset: usize) {
    if predicate.is_empty() {
        return;
    }
    sql.push_str(" WHERE ");
    sql.push_str(
        &predicate
            .iter()
            .enumerate()
            .map(|(i, (col, _))| format!("{col} = ?{}", offset + i + 1))
            .join(" AND "),
    );
}

/// True only for primary-key and uniqueness conflicts. Other constraint
/// failures (foreign keys, CHECKs) are real errors and must not be
/// mistaken for "row already present".
fn is_duplicate_key(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                || e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> Store {
        Store::open_in_memory().unwrap()
    }

    fn team_fields(id: i64, abbr: &str) -> FieldMap {
        vec![
            ("team_id", id.into()),
            ("full_name", format!("Team {abbr}").into()),
            ("abbreviation", abbr.into()),
            ("division", 17i64.into()),
            ("conference", 6i64.into()),
            ("active", true.into()),
            ("franchise_id", id.into()),
        ]
    }

    #[test]
    fn insert_then_select_round_trips() {
        let store = store();
        store.insert("team", &team_fields(6, "BOS")).unwrap();

        let rows = store
            .select("team", &["team_id", "abbreviation"], &[("team_id", 6i64.into())])
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["team_id"], FieldValue::Integer(6));
        assert_eq!(rows[0]["abbreviation"], FieldValue::Text("BOS".into()));
    }

    #[test]
    fn duplicate_primary_key_is_typed() {
        let store = store();
        store.insert("team", &team_fields(6, "BOS")).unwrap();

        let err = store.insert("team", &team_fields(6, "BOS")).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { .. }));
        assert!(!store.insert_or_skip("team", &team_fields(6, "BOS")).unwrap());
    }

    fn player_fields(player_id: i64, team_id: i64, position: &str) -> FieldMap {
        vec![
            ("player_id", player_id.into()),
            ("team_id", team_id.into()),
            ("first_name", "Patrice".into()),
            ("last_name", "Bergeron".into()),
            ("position", position.into()),
            ("handedness", "R".into()),
        ]
    }

    #[test]
    fn foreign_key_violation_is_not_a_duplicate() {
        let store = store();

        let err = store
            .insert("player", &player_fields(37, 55, "C"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Sqlite(_)));

        let err = store
            .insert_or_skip("player", &player_fields(37, 55, "C"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Sqlite(_)));
    }

    #[test]
    fn check_violation_is_not_a_duplicate() {
        let store = store();
        store.insert("team", &team_fields(6, "BOS")).unwrap();

        let err = store
            .insert("player", &player_fields(37, 6, "N/A"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Sqlite(_)));

        let rows = store.select("player", &["player_id"], &[]).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn unknown_field_fails_loudly() {
        let store = store();
        let mut fields = team_fields(6, "BOS");
        fields.push(("mascot", "bear".into()));

        let err = store.insert("team", &fields).unwrap_err();
        assert!(matches!(
            err,
            StoreError::UnknownField { ref field, .. } if field == "mascot"
        ));
    }

    #[test]
    fn unknown_table_fails_loudly() {
        let store = store();
        let err = store.select("boxscore", &[], &[]).unwrap_err();
        assert!(matches!(err, StoreError::UnknownTable(_)));
    }

    #[test]
    fn update_touches_matching_rows_only() {
        let store = store();
        store.insert("team", &team_fields(6, "BOS")).unwrap();
        store.insert("team", &team_fields(10, "TOR")).unwrap();

        let touched = store
            .update(
                "team",
                &vec![("active", false.into())],
                &[("team_id", 6i64.into())],
            )
            .unwrap();
        assert_eq!(touched, 1);

        let rows = store
            .select("team", &["active"], &[("team_id", 10i64.into())])
            .unwrap();
        assert_eq!(rows[0]["active"], FieldValue::Integer(1));
    }
}
