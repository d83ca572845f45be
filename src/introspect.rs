use postgres::types::{accepts, FromSql, Type};
use std::error::Error as StdError;
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::*;

// --------------------------------------------------------------------------------------------------------------------
// Catalog access
// --------------------------------------------------------------------------------------------------------------------

/// Read-only access to the schema catalog of a database
pub trait Catalog {
    /// Columns of a table, in any order
    fn columns(&mut self, schema: &str, table: &str) -> Result<Vec<ColumnMetadata>>;
    fn foreign_keys(&mut self, schema: &str, table: &str) -> Result<Vec<ForeignKeyMetadata>>;
    fn unique_columns(&mut self, schema: &str, table: &str) -> Result<UniqueColumns>;
    fn primary_key_columns(&mut self, schema: &str, table: &str) -> Result<PrimaryKeyColumns>;
    /// Labels of the given enum types; types that are not enums are left out
    fn enum_labels(&mut self, schema: &str, type_names: &[String]) -> Result<BTreeMap<String, Vec<String>>>;
}

/// A catalog behind a connection that has to be closed once done with
pub trait Session: Catalog + Sized {
    fn close(self) -> Result<()>;
}

impl Session for postgres::Client {
    fn close(self) -> Result<()> {
        postgres::Client::close(self).map_err(Error::Query)
    }
}

impl Catalog for postgres::Client {
    fn columns(&mut self, schema: &str, table: &str) -> Result<Vec<ColumnMetadata>> {
        let columns_sql = include_str!("resources/columns.sql");
        let mut columns = Vec::new();
        for row in self.query(columns_sql, &[&schema, &table])? {
            let nullable: Nullability = row.try_get("is_nullable")?;
            columns.push(ColumnMetadata {
                name: row.try_get("name")?,
                declared_type: row.try_get("declared_type")?,
                udt_name: row.try_get("udt_name")?,
                max_length: row.try_get("max_length")?,
                nullable: nullable == Nullability::Nullable,
                default: row.try_get("column_default")?,
                ordinal_position: row.try_get("ordinal_position")?,
            });
        }
        Ok(columns)
    }

    fn foreign_keys(&mut self, schema: &str, table: &str) -> Result<Vec<ForeignKeyMetadata>> {
        let foreign_keys_sql = include_str!("resources/foreign_keys.sql");
        let mut foreign_keys = Vec::new();
        for row in self.query(foreign_keys_sql, &[&schema, &table])? {
            foreign_keys.push(ForeignKeyMetadata {
                column_name: row.try_get("column_name")?,
                referenced_table: row.try_get("referenced_table")?,
                referenced_column: row.try_get("referenced_column")?,
            });
        }
        Ok(foreign_keys)
    }

    fn unique_columns(&mut self, schema: &str, table: &str) -> Result<UniqueColumns> {
        let unique_sql = include_str!("resources/unique_constraints.sql");
        let mut columns = BTreeSet::new();
        for row in self.query(unique_sql, &[&schema, &table])? {
            columns.insert(row.try_get("column_name")?);
        }
        Ok(UniqueColumns(columns))
    }

    fn primary_key_columns(&mut self, schema: &str, table: &str) -> Result<PrimaryKeyColumns> {
        let primary_keys_sql = include_str!("resources/primary_keys.sql");
        let mut columns = BTreeSet::new();
        for row in self.query(primary_keys_sql, &[&schema, &table])? {
            columns.insert(row.try_get("column_name")?);
        }
        Ok(PrimaryKeyColumns(columns))
    }

    fn enum_labels(&mut self, schema: &str, type_names: &[String]) -> Result<BTreeMap<String, Vec<String>>> {
        let enum_sql = include_str!("resources/enum_labels.sql");
        let mut labels = BTreeMap::new();
        for row in self.query(enum_sql, &[&schema, &type_names])? {
            labels.insert(row.try_get("type_name")?, row.try_get("labels")?);
        }
        Ok(labels)
    }
}

// --------------------------------------------------------------------------------------------------------------------
// Introspection
// --------------------------------------------------------------------------------------------------------------------

/// Collect the metadata of one table.
///
/// Fails with `NotFound` when the table has no columns, which is also what a
/// missing table looks like from the catalog.
pub fn run<C: Catalog + ?Sized>(catalog: &mut C, schema: &str, table: &str) -> Result<TableMetadata> {
    let mut columns = catalog.columns(schema, table)?;
    if columns.is_empty() {
        return Err(Error::NotFound(format!("table '{}.{}'", schema, table)));
    }
    columns.sort_by_key(|c| c.ordinal_position);
    debug!(table, columns = columns.len(), "read columns");

    let foreign_keys = catalog.foreign_keys(schema, table)?;
    let unique_columns = catalog.unique_columns(schema, table)?;
    debug!(table, foreign_keys = foreign_keys.len(), unique = unique_columns.len(), "read constraints");

    // Tables without a declared key fall back to the `id` convention
    let mut primary_key = catalog.primary_key_columns(schema, table)?;
    if primary_key.is_empty() && columns.iter().any(|c| c.name == "id") {
        primary_key.0.insert("id".to_string());
    }

    let enum_types: Vec<String> = columns
        .iter()
        .filter(|c| c.declared_type == "USER-DEFINED")
        .map(|c| c.udt_name.clone())
        .collect();
    let enum_labels = if enum_types.is_empty() {
        BTreeMap::new()
    } else {
        catalog.enum_labels(schema, &enum_types)?
    };

    Ok(TableMetadata {
        schema: schema.to_string(),
        name: table.to_string(),
        columns,
        foreign_keys,
        unique_columns,
        primary_key,
        enum_labels,
    })
}

// --------------------------------------------------------------------------------------------------------------------
// Private stuff
// --------------------------------------------------------------------------------------------------------------------

/// Parse the is_nullable field as coming from information_schema
impl<'a> FromSql<'a> for Nullability {
    fn from_sql(_ty: &Type, raw: &'a [u8]) -> std::result::Result<Self, Box<dyn StdError + Sync + Send>> {
        match postgres_protocol::types::text_from_sql(raw)? {
            "YES" => Ok(Nullability::Nullable),
            "NO" => Ok(Nullability::NotNull),
            e => Err(format!("Unknown yes_or_no value '{}'", e).into()),
        }
    }

    accepts!(TEXT, VARCHAR);
}

/// Parse the column_default expression
impl<'a> FromSql<'a> for DefaultValue {
    fn from_sql(_ty: &Type, raw: &'a [u8]) -> std::result::Result<Self, Box<dyn StdError + Sync + Send>> {
        let expr = postgres_protocol::types::text_from_sql(raw)?;
        Ok(DefaultValue::parse(expr))
    }

    accepts!(TEXT, VARCHAR);
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// In-memory catalog holding a single table
    #[derive(Default)]
    pub(crate) struct FakeCatalog {
        pub table: String,
        pub columns: Vec<ColumnMetadata>,
        pub foreign_keys: Vec<ForeignKeyMetadata>,
        pub unique: BTreeSet<String>,
        pub primary_key: BTreeSet<String>,
        pub enums: BTreeMap<String, Vec<String>>,
        pub queries: usize,
        /// Shared so it can still be read once the session is consumed
        pub closes: Rc<Cell<usize>>,
    }

    impl Session for FakeCatalog {
        fn close(self) -> Result<()> {
            self.closes.set(self.closes.get() + 1);
            Ok(())
        }
    }

    impl Catalog for FakeCatalog {
        fn columns(&mut self, _schema: &str, table: &str) -> Result<Vec<ColumnMetadata>> {
            self.queries += 1;
            if table == self.table {
                Ok(self.columns.clone())
            } else {
                Ok(Vec::new())
            }
        }

        fn foreign_keys(&mut self, _schema: &str, _table: &str) -> Result<Vec<ForeignKeyMetadata>> {
            self.queries += 1;
            Ok(self.foreign_keys.clone())
        }

        fn unique_columns(&mut self, _schema: &str, _table: &str) -> Result<UniqueColumns> {
            self.queries += 1;
            Ok(UniqueColumns(self.unique.clone()))
        }

        fn primary_key_columns(&mut self, _schema: &str, _table: &str) -> Result<PrimaryKeyColumns> {
            self.queries += 1;
            Ok(PrimaryKeyColumns(self.primary_key.clone()))
        }

        fn enum_labels(&mut self, _schema: &str, type_names: &[String]) -> Result<BTreeMap<String, Vec<String>>> {
            self.queries += 1;
            Ok(self
                .enums
                .iter()
                .filter(|(name, _)| type_names.contains(name))
                .map(|(name, labels)| (name.clone(), labels.clone()))
                .collect())
        }
    }

    pub(crate) fn column(name: &str, declared_type: &str, position: i32) -> ColumnMetadata {
        ColumnMetadata {
            name: name.to_string(),
            declared_type: declared_type.to_string(),
            udt_name: declared_type.to_string(),
            max_length: None,
            nullable: false,
            default: None,
            ordinal_position: position,
        }
    }

    /// The course table: id (pk, int), title (varchar(100), not null), fee (decimal, default 0)
    pub(crate) fn course_catalog() -> FakeCatalog {
        let mut id = column("id", "integer", 1);
        id.default = Some(DefaultValue::Sequence);
        let mut title = column("title", "character varying", 2);
        title.max_length = Some(100);
        let mut fee = column("fee", "numeric", 3);
        fee.default = Some(DefaultValue::Number("0".to_string()));

        FakeCatalog {
            table: "course".to_string(),
            // deliberately out of order
            columns: vec![fee, id, title],
            primary_key: vec!["id".to_string()].into_iter().collect(),
            ..Default::default()
        }
    }

    #[test]
    fn columns_come_back_in_ordinal_order() {
        let mut catalog = course_catalog();
        let table = run(&mut catalog, "public", "course").unwrap();
        let names: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "title", "fee"]);
        assert!(table.primary_key.contains("id"));
        assert!(table.foreign_keys.is_empty());
        assert!(table.unique_columns.is_empty());
    }

    #[test]
    fn missing_table_is_not_found() {
        let mut catalog = course_catalog();
        match run(&mut catalog, "public", "nope") {
            Err(Error::NotFound(what)) => assert!(what.contains("nope")),
            other => panic!("expected NotFound, got {:?}", other),
        }
        // nothing past the column query was attempted
        assert_eq!(catalog.queries, 1);
    }

    #[test]
    fn id_is_the_key_when_none_is_declared() {
        let mut catalog = course_catalog();
        catalog.primary_key.clear();
        let table = run(&mut catalog, "public", "course").unwrap();
        assert_eq!(table.primary_key.iter().collect::<Vec<_>>(), vec!["id"]);
    }

    #[test]
    fn enum_labels_are_only_fetched_for_user_defined_columns() {
        let mut catalog = course_catalog();
        let table = run(&mut catalog, "public", "course").unwrap();
        assert!(table.enum_labels.is_empty());
        assert_eq!(catalog.queries, 4);

        let mut status = column("status", "USER-DEFINED", 4);
        status.udt_name = "enum_enrollment_status".to_string();
        catalog.columns.push(status);
        catalog.enums.insert(
            "enum_enrollment_status".to_string(),
            vec!["Active".to_string(), "Completed".to_string(), "Cancelled".to_string()],
        );
        catalog.queries = 0;
        let table = run(&mut catalog, "public", "course").unwrap();
        assert_eq!(catalog.queries, 5);
        assert_eq!(table.enum_labels["enum_enrollment_status"].len(), 3);
    }
}
