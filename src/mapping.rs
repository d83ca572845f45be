use crate::error::Result;
use crate::types::*;

/// One lookup table, catalog type -> generated type
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LookupTable {
    pub default: String,
    pub types: BTreeMap<String, String>,
}

impl LookupTable {
    pub fn get(&self, pg_type: &str) -> &str {
        self.types.get(base_type(pg_type)).unwrap_or(&self.default)
    }
}

/// Type correspondences for every generated language
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TypeMapper {
    pub sequelize: LookupTable,
    pub typescript: LookupTable,
    pub rust: LookupTable,
}

impl TypeMapper {
    /// The tables shipped with the crate
    pub fn builtin() -> Result<Self> {
        let mapper = ron::from_str(include_str!("resources/mapping.ron"))?;
        Ok(mapper)
    }

    /// Sequelize DataTypes name, STRING when unknown
    pub fn sequelize(&self, pg_type: &str) -> &str {
        self.sequelize.get(pg_type)
    }

    /// TypeScript primitive, any when unknown
    pub fn typescript(&self, pg_type: &str) -> &str {
        self.typescript.get(pg_type)
    }

    pub fn rust(&self, pg_type: &str) -> &str {
        self.rust.get(pg_type)
    }
}

/// TypeScript type of a Sequelize data type, for when only the latter is known
pub fn typescript_for_sequelize(orm_type: &str) -> &'static str {
    match orm_type {
        "STRING" | "TEXT" | "CHAR" | "UUID" | "TIME" => "string",
        "INTEGER" | "BIGINT" | "FLOAT" | "DOUBLE" | "DECIMAL" => "number",
        "BOOLEAN" => "boolean",
        "DATE" | "DATEONLY" => "Date",
        _ => "any",
    }
}

/// Strip a parameter list, `varchar(255)` -> `varchar`
pub fn base_type(pg_type: &str) -> &str {
    pg_type.split('(').next().unwrap_or(pg_type).trim()
}
