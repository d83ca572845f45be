pub use std::collections::{BTreeMap, BTreeSet};

use derive_deref::Deref;

// --------------------------------------------------------------------------------------------------------------------
// Catalog metadata
// --------------------------------------------------------------------------------------------------------------------

/// One column of a table, as reported by information_schema.columns
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ColumnMetadata {
    pub name: String,
    pub declared_type: String,
    /// Underlying type name, the enum name for USER-DEFINED columns
    pub udt_name: String,
    pub max_length: Option<i32>,
    pub nullable: bool,
    pub default: Option<DefaultValue>,
    pub ordinal_position: i32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ForeignKeyMetadata {
    pub column_name: String,
    pub referenced_table: String,
    pub referenced_column: String,
}

/// Columns covered by a UNIQUE constraint
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq, Deref)]
pub struct UniqueColumns(pub BTreeSet<String>);

/// Columns forming the primary key
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq, Deref)]
pub struct PrimaryKeyColumns(pub BTreeSet<String>);

/// Everything introspection found out about one table
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TableMetadata {
    pub schema: String,
    pub name: String,
    pub columns: Vec<ColumnMetadata>,
    pub foreign_keys: Vec<ForeignKeyMetadata>,
    pub unique_columns: UniqueColumns,
    pub primary_key: PrimaryKeyColumns,
    /// Labels of the user-defined enum types used by the columns, keyed by type name
    pub enum_labels: BTreeMap<String, Vec<String>>,
}

impl TableMetadata {
    pub fn foreign_key(&self, column: &str) -> Option<&ForeignKeyMetadata> {
        self.foreign_keys.iter().find(|fk| fk.column_name == column)
    }
}

/// information_schema yes_or_no
#[derive(Debug, Serialize, Deserialize, PartialEq, Copy, Clone)]
pub enum Nullability {
    Nullable,
    NotNull,
}

/// Column default, as far as model generation cares
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum DefaultValue {
    /// nextval('...'), i.e. auto increment
    Sequence,
    /// CURRENT_TIMESTAMP, now() and friends
    Now,
    Boolean(bool),
    Number(String),
    Text(String),
    /// Any other SQL expression, e.g. gen_random_uuid(); kept verbatim
    Expression(String),
}

impl DefaultValue {
    /// Classify a raw column_default expression
    ///
    /// The kind of a quoted literal comes from its cast: `'12'::integer` is a
    /// number, `'12'::character varying` is text.
    pub fn parse(expr: &str) -> Self {
        let expr = expr.trim();
        let upper = expr.to_uppercase();
        if expr.starts_with("nextval(") {
            return DefaultValue::Sequence;
        }
        if upper.starts_with("CURRENT_TIMESTAMP") || upper.starts_with("NOW()") || upper.starts_with("LOCALTIMESTAMP") {
            return DefaultValue::Now;
        }

        if expr.starts_with('\'') {
            return match split_quoted(expr) {
                Some((text, cast)) => match cast {
                    Some(cast) if is_numeric_type(cast) && is_number(&text) => DefaultValue::Number(text),
                    Some(cast) if is_boolean_type(cast) => match text.as_str() {
                        "true" | "t" => DefaultValue::Boolean(true),
                        "false" | "f" => DefaultValue::Boolean(false),
                        _ => DefaultValue::Expression(expr.to_string()),
                    },
                    _ => DefaultValue::Text(text),
                },
                None => DefaultValue::Expression(expr.to_string()),
            };
        }

        // Bare token, possibly cast and wrapped in parentheses: (-1)::integer
        let value = match expr.find("::") {
            Some(end) => &expr[..end],
            None => expr,
        };
        let value = match value.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
            Some(inner) => inner.trim(),
            None => value,
        };
        match value {
            "true" => DefaultValue::Boolean(true),
            "false" => DefaultValue::Boolean(false),
            v if is_number(v) => DefaultValue::Number(v.to_string()),
            _ => DefaultValue::Expression(expr.to_string()),
        }
    }
}

/// Split `'it''s'::character varying` into `it's` and the cast, if any.
/// `None` when the literal is followed by something other than a cast.
fn split_quoted(expr: &str) -> Option<(String, Option<&str>)> {
    let mut text = String::new();
    let mut chars = expr.char_indices().skip(1).peekable();
    while let Some((i, c)) = chars.next() {
        if c != '\'' {
            text.push(c);
            continue;
        }
        if let Some((_, '\'')) = chars.peek() {
            chars.next();
            text.push('\'');
            continue;
        }

        // Closing quote
        let rest = expr[i + 1..].trim();
        return if rest.is_empty() {
            Some((text, None))
        } else {
            rest.strip_prefix("::")
                .map(str::trim)
                .filter(|cast| is_type_name(cast))
                .map(|cast| (text, Some(cast)))
        };
    }
    None
}

fn is_type_name(cast: &str) -> bool {
    !cast.is_empty() && cast.chars().all(|c| c.is_ascii_alphanumeric() || " _(),.[]\"".contains(c))
}

fn is_number(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit() || "+-.eE".contains(c)) && s.parse::<f64>().is_ok()
}

fn is_numeric_type(cast: &str) -> bool {
    let base = cast.split('(').next().unwrap_or(cast).trim();
    matches!(
        base,
        "smallint"
            | "integer"
            | "bigint"
            | "int2"
            | "int4"
            | "int8"
            | "numeric"
            | "decimal"
            | "real"
            | "double precision"
            | "float4"
            | "float8"
    )
}

fn is_boolean_type(cast: &str) -> bool {
    cast == "boolean" || cast == "bool"
}

// --------------------------------------------------------------------------------------------------------------------
// Generated model description
// --------------------------------------------------------------------------------------------------------------------

/// Sequelize data type of a field
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OrmType {
    pub name: String,
    pub length: Option<i32>,
    /// Non-empty for enum columns
    pub labels: Vec<String>,
}

impl std::fmt::Display for OrmType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.labels.is_empty() {
            let labels: Vec<String> = self.labels.iter().map(|l| crate::render::js_string(l)).collect();
            return write!(f, "ENUM({})", labels.join(", "));
        }
        match self.length {
            Some(length) if self.name == "STRING" => write!(f, "STRING({})", length),
            _ => f.write_str(&self.name),
        }
    }
}

/// One field of the model being generated
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FieldSpec {
    pub column: String,
    pub property: String,
    pub orm_type: OrmType,
    pub ts_type: String,
    pub rust_type: String,
    pub nullable: bool,
    pub optional: bool,
    pub primary_key: bool,
    pub unique: bool,
    pub default: Option<DefaultValue>,
    pub references: Option<ForeignKeyMetadata>,
}

impl FieldSpec {
    pub fn auto_increment(&self) -> bool {
        self.default == Some(DefaultValue::Sequence)
    }
}

/// Structured description of a model file, ready to be rendered
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ModelSpec {
    pub class_name: String,
    pub table_name: String,
    pub fields: Vec<FieldSpec>,
    pub generated_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl ModelSpec {
    pub fn primary_key(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.primary_key)
    }

    pub fn optional_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.optional)
    }

    /// Unique columns that are not part of the primary key
    pub fn unique_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.unique && !f.primary_key)
    }

    pub fn foreign_key_count(&self) -> usize {
        self.fields.iter().filter(|f| f.references.is_some()).count()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.fields.iter().any(|f| f.column == column)
    }
}
