use chrono::{DateTime, Utc};

use super::{banner, js_string};
use crate::mongo::TIMESTAMP_INDEXES;
use crate::naming::{singularize, to_pascal_case};

/// Model name for a collection, `course_teachers` -> `CourseTeacher`
pub fn class_name(collection: &str) -> String {
    to_pascal_case(singularize(collection))
}

pub fn file_name(collection: &str) -> String {
    format!("{}.js", class_name(collection))
}

/// Mongoose model scaffold for a collection
pub fn render(collection: &str, generated_at: Option<DateTime<Utc>>) -> String {
    let class = class_name(collection);
    let schema = schema_var(&class);
    let mut out = String::new();

    out.push_str("const mongoose = require('mongoose');\n");
    out.push('\n');
    banner(
        &mut out,
        &format!("{} Mongoose Model", class),
        &[format!("Collection: {}", collection)],
        generated_at,
    );
    out.push_str(&format!("const {} = new mongoose.Schema(\n", schema));
    out.push_str("  {\n");
    out.push_str("    // Schema fields\n");
    out.push_str("  },\n");
    out.push_str("  {\n");
    out.push_str("    timestamps: true,\n");
    out.push_str(&format!("    collection: {},\n", js_string(collection)));
    for option in &["toJSON", "toObject"] {
        out.push_str(&format!("    {}: {{\n", option));
        out.push_str("      transform(doc, ret) {\n");
        out.push_str("        ret.id = ret._id;\n");
        out.push_str("        delete ret._id;\n");
        out.push_str("        delete ret.__v;\n");
        out.push_str("        return ret;\n");
        out.push_str("      },\n");
        out.push_str("    },\n");
    }
    out.push_str("  }\n");
    out.push_str(");\n");
    out.push('\n');

    for (field, direction) in TIMESTAMP_INDEXES {
        out.push_str(&format!("{}.index({{ {}: {} }});\n", schema, field, direction));
    }
    out.push('\n');

    out.push_str(&format!("const {} = mongoose.model({}, {});\n", class, js_string(&class), schema));
    out.push('\n');
    out.push_str(&format!("module.exports = {};\n", class));

    out
}

fn schema_var(class: &str) -> String {
    let mut chars = class.chars();
    match chars.next() {
        Some(first) => format!("{}{}Schema", first.to_ascii_lowercase(), chars.as_str()),
        None => "schema".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names() {
        assert_eq!(class_name("users"), "User");
        assert_eq!(class_name("borrow_records"), "BorrowRecord");
        assert_eq!(file_name("books"), "Book.js");
        assert_eq!(schema_var("BorrowRecord"), "borrowRecordSchema");
    }

    #[test]
    fn renders_the_scaffold() {
        let rendered = render("books", None);
        assert!(rendered.contains("const bookSchema = new mongoose.Schema("));
        assert!(rendered.contains("    collection: 'books',\n"));
        assert!(rendered.contains("bookSchema.index({ createdAt: -1 });"));
        assert!(rendered.contains("const Book = mongoose.model('Book', bookSchema);"));
        assert!(rendered.ends_with("module.exports = Book;\n"));
        assert!(!rendered.contains("Generated:"));
        assert_eq!(rendered, render("books", None));
    }
}
