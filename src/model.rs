use chrono::{DateTime, Utc};
use itertools::Itertools;

use crate::mapping::{typescript_for_sequelize, TypeMapper};
use crate::naming::to_camel_case;
use crate::render::Target;
use crate::types::*;

/// Turn the catalog metadata of a table into the description of its model
pub fn build(
    table: &TableMetadata,
    mapper: &TypeMapper,
    target: Target,
    generated_at: Option<DateTime<Utc>>,
) -> ModelSpec {
    let fields = table.columns.iter().map(|column| build_field(table, mapper, target, column)).collect();

    ModelSpec {
        class_name: target.class_name(&table.name),
        table_name: table.name.clone(),
        fields,
        generated_at,
    }
}

fn build_field(table: &TableMetadata, mapper: &TypeMapper, target: Target, column: &ColumnMetadata) -> FieldSpec {
    let primary_key = table.primary_key.contains(&column.name);
    let labels = table.enum_labels.get(&column.udt_name).cloned().unwrap_or_default();

    let orm_type = OrmType {
        name: mapper.sequelize(&column.declared_type).to_string(),
        length: column.max_length,
        labels,
    };

    // Enum columns are a closed set of strings, not `any`
    let ts_type = if !orm_type.labels.is_empty() {
        orm_type.labels.iter().map(|l| serde_json::Value::from(l.as_str()).to_string()).join(" | ")
    } else if target == Target::Javascript {
        typescript_for_sequelize(&orm_type.name).to_string()
    } else {
        mapper.typescript(&column.declared_type).to_string()
    };

    FieldSpec {
        column: column.name.clone(),
        property: to_camel_case(&column.name),
        orm_type,
        ts_type,
        rust_type: mapper.rust(&column.declared_type).to_string(),
        nullable: column.nullable,
        optional: column.nullable || column.default.is_some() || primary_key,
        primary_key,
        unique: table.unique_columns.contains(&column.name),
        default: column.default.clone(),
        references: table.foreign_key(&column.name).cloned(),
    }
}
