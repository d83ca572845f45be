use itertools::Itertools;

use super::{banner, default_literal, js_string, json_string, DefaultSyntax};
use crate::types::*;

const DEFAULTS: DefaultSyntax = DefaultSyntax {
    now: "Sequelize.NOW",
    literal: "Sequelize.literal",
    quote: json_string,
};

/// Sequelize model written in TypeScript
pub fn render(spec: &ModelSpec) -> String {
    let class = &spec.class_name;
    let mut out = String::new();

    out.push_str("import * as Sequelize from 'sequelize';\n");
    out.push_str("import { DataTypes, Model, Optional } from 'sequelize';\n");
    out.push('\n');
    banner(
        &mut out,
        &format!("{} Model", class),
        &[format!("Auto-generated from table: {}", spec.table_name)],
        spec.generated_at,
    );

    // Attributes interface
    out.push_str(&format!("export interface {}Attributes {{\n", class));
    for field in &spec.fields {
        let marker = if field.optional { "?" } else { "" };
        out.push_str(&format!("  {}{}: {};\n", field.property, marker, field.ts_type));
    }
    out.push_str("}\n");
    out.push('\n');

    // Key and creation types
    let pk = spec.primary_key().map(|f| json_string(&f.property)).join(" | ");
    let optional = spec.optional_fields().map(|f| json_string(&f.property)).join(" | ");
    out.push_str(&format!("export type {}Pk = {};\n", class, or_never(pk)));
    out.push_str(&format!("export type {0}Id = {0}[{0}Pk];\n", class));
    out.push_str(&format!("export type {}OptionalAttributes = {};\n", class, or_never(optional)));
    out.push_str(&format!(
        "export type {0}CreationAttributes = Optional<{0}Attributes, {0}OptionalAttributes>;\n",
        class
    ));
    out.push('\n');

    // Class declaration
    out.push_str(&format!(
        "export class {0} extends Model<{0}Attributes, {0}CreationAttributes> implements {0}Attributes {{\n",
        class
    ));
    for field in &spec.fields {
        let marker = if field.optional { "?" } else { "!" };
        out.push_str(&format!("  {}{}: {};\n", field.property, marker, field.ts_type));
    }
    out.push('\n');

    // Initialization
    out.push_str(&format!("  static initModel(sequelize: Sequelize.Sequelize): typeof {} {{\n", class));
    out.push_str(&format!("    return {}.init({{\n", class));
    out.push_str(&format!("{}\n", spec.fields.iter().map(field_block).join(",\n")));
    out.push_str("    }, {\n");
    out.push_str("      sequelize,\n");
    out.push_str(&format!("      tableName: {},\n", js_string(&spec.table_name)));
    out.push_str("      timestamps: false,\n");
    if let Some(indexes) = index_block(spec) {
        out.push_str(&format!("{}\n", indexes));
    }
    out.push_str("    });\n");
    out.push_str("  }\n");
    out.push_str("}\n");
    out.push('\n');
    out.push_str(&format!("export default {};\n", class));

    out
}

fn or_never(union: String) -> String {
    if union.is_empty() {
        "never".to_string()
    } else {
        union
    }
}

fn field_block(field: &FieldSpec) -> String {
    let mut entries = Vec::new();
    if field.auto_increment() {
        entries.push("autoIncrement: true".to_string());
    }
    entries.push(format!("type: DataTypes.{}", field.orm_type));
    entries.push(format!("allowNull: {}", field.nullable));
    if field.primary_key {
        entries.push("primaryKey: true".to_string());
    } else if field.unique {
        entries.push("unique: true".to_string());
    }
    if let Some(value) = field.default.as_ref().and_then(|d| default_literal(d, &DEFAULTS)) {
        entries.push(format!("defaultValue: {}", value));
    }
    if let Some(fk) = &field.references {
        entries.push(format!(
            "references: {{\n          model: {},\n          key: {}\n        }}",
            js_string(&fk.referenced_table),
            js_string(&fk.referenced_column)
        ));
    }

    format!(
        "      {}: {{\n{}\n      }}",
        field.property,
        entries.iter().map(|e| format!("        {}", e)).join(",\n")
    )
}

/// Index declarations, only when the table has unique or foreign keys
fn index_block(spec: &ModelSpec) -> Option<String> {
    if !spec.fields.iter().any(|f| f.unique) && spec.foreign_key_count() == 0 {
        return None;
    }

    let mut indexes = Vec::new();
    let pk: Vec<&FieldSpec> = spec.primary_key().collect();
    if !pk.is_empty() {
        indexes.push(index("PRIMARY", pk.iter().map(|f| f.column.as_str())));
    }
    for field in spec.unique_fields() {
        indexes.push(index(&field.column, std::iter::once(field.column.as_str())));
    }
    if indexes.is_empty() {
        return None;
    }

    Some(format!("      indexes: [\n{}\n      ]", indexes.join(",\n")))
}

fn index<'a>(name: &str, columns: impl Iterator<Item = &'a str>) -> String {
    let fields = columns.map(|c| format!("            {{ name: {} }}", json_string(c))).join(",\n");
    format!(
        concat!(
            "        {{\n",
            "          name: {},\n",
            "          unique: true,\n",
            "          using: \"BTREE\",\n",
            "          fields: [\n{}\n",
            "          ]\n",
            "        }}",
        ),
        json_string(name),
        fields
    )
}
