use itertools::Itertools;

use super::{banner, default_literal, js_string, DefaultSyntax};
use crate::types::*;

const DEFAULTS: DefaultSyntax = DefaultSyntax {
    now: "DataTypes.NOW",
    literal: "sequelize.literal",
    quote: js_string,
};

/// Sequelize model as a CommonJS module, camelCase properties over snake_case columns
pub fn render(spec: &ModelSpec) -> String {
    let class = &spec.class_name;
    let timestamps = spec.has_column("created_at") || spec.has_column("updated_at");
    let mut out = String::new();

    out.push_str("const { DataTypes, Model } = require('sequelize');\n");
    out.push_str("const sequelize = require('../../config/database');\n");
    out.push('\n');

    // The property list doubles as the type documentation of the class
    let mut lines = vec![format!("Auto-generated from table: {}", spec.table_name), String::new()];
    for field in &spec.fields {
        let name = if field.optional {
            format!("[{}]", field.property)
        } else {
            field.property.clone()
        };
        lines.push(format!("@property {{{}}} {}", field.ts_type, name));
    }
    banner(&mut out, &format!("{} Model", class), &lines, spec.generated_at);
    out.push_str(&format!("class {} extends Model {{}}\n", class));
    out.push('\n');

    out.push_str(&format!("{}.init(\n", class));
    out.push_str("  {\n");
    for field in &spec.fields {
        out.push_str(&format!("{}\n", field_block(field)));
    }
    out.push_str("  },\n");
    out.push_str("  {\n");
    out.push_str("    sequelize,\n");
    out.push_str(&format!("    modelName: {},\n", js_string(class)));
    out.push_str(&format!("    tableName: {},\n", js_string(&spec.table_name)));
    out.push_str(&format!("    timestamps: {},\n", timestamps));
    if timestamps {
        out.push_str("    underscored: true,\n");
    }
    out.push_str("  }\n");
    out.push_str(");\n");
    out.push('\n');
    out.push_str(&format!("module.exports = {};\n", class));

    out
}

fn field_block(field: &FieldSpec) -> String {
    let mut entries = vec![format!("type: DataTypes.{}", field.orm_type)];
    if field.column != field.property {
        entries.push(format!("field: {}", js_string(&field.column)));
    }
    if field.auto_increment() {
        entries.push("autoIncrement: true".to_string());
    }
    if field.primary_key {
        entries.push("primaryKey: true".to_string());
    }
    if !field.nullable {
        entries.push("allowNull: false".to_string());
    }
    if field.unique && !field.primary_key {
        entries.push("unique: true".to_string());
    }
    if let Some(value) = field.default.as_ref().and_then(|d| default_literal(d, &DEFAULTS)) {
        entries.push(format!("defaultValue: {}", value));
    }
    if let Some(fk) = &field.references {
        entries.push(format!(
            "references: {{\n        model: {},\n        key: {},\n      }}",
            js_string(&fk.referenced_table),
            js_string(&fk.referenced_column)
        ));
        entries.push("onUpdate: 'CASCADE'".to_string());
        entries.push("onDelete: 'CASCADE'".to_string());
    }

    format!(
        "    {}: {{\n{},\n    }},",
        field.property,
        entries.iter().map(|e| format!("      {}", e)).join(",\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::course_model;
    use crate::render::Target;
    use pretty_assertions::assert_eq;

    #[test]
    fn expression_defaults_become_literals() {
        let mut spec = course_model(Target::Javascript);
        spec.fields[1].default = Some(DefaultValue::parse("lower('NEW'::text)"));
        let rendered = render(&spec);
        assert!(rendered.contains("      defaultValue: sequelize.literal('lower(\\'NEW\\'::text)'),\n"));
    }

    #[test]
    fn renders_the_course_model() {
        let rendered = render(&course_model(Target::Javascript));
        let expected = r#"const { DataTypes, Model } = require('sequelize');
const sequelize = require('../../config/database');

/**
 * Course Model
 * Auto-generated from table: course
 *
 * @property {number} [id]
 * @property {string} title
 * @property {number} [fee]
 */
class Course extends Model {}

Course.init(
  {
    id: {
      type: DataTypes.INTEGER,
      autoIncrement: true,
      primaryKey: true,
      allowNull: false,
    },
    title: {
      type: DataTypes.STRING(100),
      allowNull: false,
    },
    fee: {
      type: DataTypes.DECIMAL,
      allowNull: false,
      defaultValue: 0,
    },
  },
  {
    sequelize,
    modelName: 'Course',
    tableName: 'course',
    timestamps: false,
  }
);

module.exports = Course;
"#;
        assert_eq!(rendered, expected);
    }

    #[test]
    fn snake_case_columns_are_mapped_and_cascade() {
        let mut spec = course_model(Target::Javascript);
        let mut field = spec.fields[1].clone();
        field.column = "teacher_id".to_string();
        field.property = "teacherId".to_string();
        field.references = Some(ForeignKeyMetadata {
            column_name: "teacher_id".to_string(),
            referenced_table: "teacher".to_string(),
            referenced_column: "id".to_string(),
        });
        spec.fields.push(field);
        let rendered = render(&spec);
        assert!(rendered.contains("      field: 'teacher_id',\n"));
        assert!(rendered.contains("      onDelete: 'CASCADE',\n"));
    }

    #[test]
    fn timestamps_switch_on_underscored() {
        let mut spec = course_model(Target::Javascript);
        let mut created = spec.fields[1].clone();
        created.column = "created_at".to_string();
        created.property = "createdAt".to_string();
        created.default = Some(DefaultValue::Now);
        spec.fields.push(created);
        let rendered = render(&spec);
        assert!(rendered.contains("    timestamps: true,\n    underscored: true,\n"));
        assert!(rendered.contains("defaultValue: DataTypes.NOW"));
    }
}
