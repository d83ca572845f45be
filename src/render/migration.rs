use chrono::{DateTime, Utc};

use super::{banner, js_string};

/// One column of a createTable call
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
    pub name: String,
    /// `key: value` pairs, values are JavaScript expressions
    pub attributes: Vec<(&'static str, String)>,
}

/// The columns every new table starts with: an auto-increment key and the two timestamps
pub fn starter_columns(table: &str) -> Vec<ColumnDescriptor> {
    let timestamp = |name: &str, comment: &str| ColumnDescriptor {
        name: name.to_string(),
        attributes: vec![
            ("allowNull", "false".to_string()),
            ("type", "Sequelize.DATE".to_string()),
            ("defaultValue", "Sequelize.literal('CURRENT_TIMESTAMP')".to_string()),
            ("comment", js_string(comment)),
        ],
    };

    vec![
        ColumnDescriptor {
            name: "id".to_string(),
            attributes: vec![
                ("allowNull", "false".to_string()),
                ("autoIncrement", "true".to_string()),
                ("primaryKey", "true".to_string()),
                ("type", "Sequelize.INTEGER".to_string()),
                ("comment", js_string(&format!("Primary key for {} table", table))),
            ],
        },
        timestamp("created_at", "Record creation timestamp"),
        timestamp("updated_at", "Record last update timestamp"),
    ]
}

/// `20250817163741-create-students.js`
pub fn file_name(table: &str, at: DateTime<Utc>) -> String {
    format!("{}-create-{}.js", at.format("%Y%m%d%H%M%S"), table)
}

/// sequelize-cli migration creating `table` with the given columns
pub fn render(table: &str, columns: &[ColumnDescriptor], generated_at: Option<DateTime<Utc>>) -> String {
    let mut out = String::new();

    out.push_str("'use strict';\n");
    out.push('\n');
    banner(
        &mut out,
        &format!("Migration: Create {} table", table),
        &["Database: PostgreSQL (Relational)".to_string(), "Naming Convention: snake_case columns".to_string()],
        generated_at,
    );
    out.push_str("module.exports = {\n");
    out.push_str("  async up(queryInterface, Sequelize) {\n");
    out.push_str(&format!("    await queryInterface.createTable({}, {{\n", js_string(table)));
    for column in columns {
        out.push_str(&format!("      {}: {{\n", column.name));
        for (key, value) in &column.attributes {
            out.push_str(&format!("        {}: {},\n", key, value));
        }
        out.push_str("      },\n");
    }
    out.push_str("    });\n");
    out.push_str("  },\n");
    out.push('\n');
    out.push_str("  async down(queryInterface, Sequelize) {\n");
    out.push_str(&format!("    await queryInterface.dropTable({});\n", js_string(table)));
    out.push_str("  },\n");
    out.push_str("};\n");

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn file_names_carry_the_timestamp() {
        let at = Utc.with_ymd_and_hms(2025, 8, 17, 16, 37, 41).unwrap();
        assert_eq!(file_name("students", at), "20250817163741-create-students.js");
    }

    #[test]
    fn renders_up_and_down() {
        let rendered = render("students", &starter_columns("students"), None);
        let expected = r#"'use strict';

/**
 * Migration: Create students table
 * Database: PostgreSQL (Relational)
 * Naming Convention: snake_case columns
 */
module.exports = {
  async up(queryInterface, Sequelize) {
    await queryInterface.createTable('students', {
      id: {
        allowNull: false,
        autoIncrement: true,
        primaryKey: true,
        type: Sequelize.INTEGER,
        comment: 'Primary key for students table',
      },
      created_at: {
        allowNull: false,
        type: Sequelize.DATE,
        defaultValue: Sequelize.literal('CURRENT_TIMESTAMP'),
        comment: 'Record creation timestamp',
      },
      updated_at: {
        allowNull: false,
        type: Sequelize.DATE,
        defaultValue: Sequelize.literal('CURRENT_TIMESTAMP'),
        comment: 'Record last update timestamp',
      },
    });
  },

  async down(queryInterface, Sequelize) {
    await queryInterface.dropTable('students');
  },
};
"#;
        assert_eq!(rendered, expected);
    }
}
