use chrono::SecondsFormat;
use heck::SnakeCase;

use crate::types::*;

// --------------------------------------------------------------------------------------------------------------------
// Public functions
// --------------------------------------------------------------------------------------------------------------------

/// Row struct for the table, mapped with postgres-mapper
pub fn render(spec: &ModelSpec) -> String {
    let mut scope = codegen::Scope::new();

    scope.import("postgres_mapper", "PostgresMapper");
    scope.import("serde", "Deserialize");
    scope.import("serde", "Serialize");

    let mut header = format!("// Auto-generated from table: {}", spec.table_name);
    if let Some(ts) = spec.generated_at {
        header.push_str(&format!("\n// Generated: {}", ts.to_rfc3339_opts(SecondsFormat::Millis, true)));
    }
    scope.raw(&header);

    gen_struct(&mut scope, spec);

    // Done
    scope.to_string() + "\n"
}

// --------------------------------------------------------------------------------------------------------------------
// Private functions
// --------------------------------------------------------------------------------------------------------------------

fn gen_struct(scope: &mut codegen::Scope, spec: &ModelSpec) {
    // Create the new struct definition
    let new_struct = scope.new_struct(&spec.class_name);

    // Make it public
    new_struct.vis("pub");

    // Add the derives
    new_struct.derive("Debug");
    new_struct.derive("Clone");
    new_struct.derive("PostgresMapper");
    new_struct.derive("Serialize");
    new_struct.derive("Deserialize");

    // Add the annotation
    new_struct.r#macro(&format!("#[pg_mapper(table = \"{}\")]", spec.table_name));

    // Generate the struct fields
    // NOTE: only NULL-able columns become an Option, a column with a default is always present in a fetched row
    for field in &spec.fields {
        let rs_name = gen_fld_name(&field.column);
        let rs_type = if field.nullable {
            format!("Option<{}>", field.rust_type)
        } else {
            field.rust_type.clone()
        };

        let mut fld = codegen::Field::new(&format!("pub {}", rs_name), rs_type);
        if !rs_name.eq(&field.column) {
            fld.annotation(format!("#[postgres(name = \"{}\")]", field.column));
        }
        new_struct.push_field(fld);
    }
}

/// Convert a PostgreSQL column name to a safe Rust name
///
fn gen_fld_name(name: &str) -> String {
    let name = name.to_snake_case();
    if is_keyword(&name) {
        format!("r#{}", name)
    } else {
        name
    }
}

fn is_keyword(name: &str) -> bool {
    matches!(
        name,
        "as" | "break"
            | "const"
            | "continue"
            | "crate"
            | "else"
            | "enum"
            | "extern"
            | "false"
            | "fn"
            | "for"
            | "if"
            | "impl"
            | "in"
            | "let"
            | "loop"
            | "match"
            | "mod"
            | "move"
            | "mut"
            | "pub"
            | "ref"
            | "return"
            | "static"
            | "struct"
            | "trait"
            | "true"
            | "type"
            | "unsafe"
            | "use"
            | "where"
            | "while"
            | "async"
            | "await"
            | "dyn"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::course_model;
    use crate::render::Target;

    #[test]
    fn renders_a_mapped_struct() {
        let rendered = render(&course_model(Target::Rust));
        assert!(rendered.contains("#[pg_mapper(table = \"course\")]"));
        assert!(rendered.contains("pub struct Course {"));
        assert!(rendered.contains("pub id: i32,"));
        assert!(rendered.contains("pub title: String,"));
        assert!(rendered.contains("pub fee: rust_decimal::Decimal,"));
        assert!(rendered.starts_with("use postgres_mapper::PostgresMapper;"));
    }

    #[test]
    fn nullable_columns_are_options_and_keywords_are_escaped() {
        let mut spec = course_model(Target::Rust);
        let mut kind = spec.fields[1].clone();
        kind.column = "type".to_string();
        kind.nullable = true;
        spec.fields.push(kind);
        let rendered = render(&spec);
        assert!(rendered.contains("#[postgres(name = \"type\")]"));
        assert!(rendered.contains("pub r#type: Option<String>,"));
    }
}
