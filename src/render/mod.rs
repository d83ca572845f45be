//! Text emitters.
//!
//! Every renderer is a pure function of its input: the same description always
//! produces the same bytes. Anything that varies between runs, like the
//! generation timestamp, is part of that input.

pub mod javascript;
pub mod migration;
pub mod mongoose;
pub mod rust;
pub mod typescript;

use chrono::{DateTime, SecondsFormat, Utc};
use heck::{CamelCase, SnakeCase};

use crate::naming::{singularize, to_pascal_case};
use crate::types::{DefaultValue, ModelSpec};

/// Kind of model file generated from a table
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Target {
    /// Sequelize model in TypeScript
    Typescript,
    /// Sequelize model in CommonJS
    Javascript,
    /// Row struct for rust-postgres
    Rust,
}

impl Target {
    pub fn class_name(&self, table: &str) -> String {
        match self {
            // The TypeScript models keep the table name as it is
            Target::Typescript => table.to_string(),
            Target::Javascript => to_pascal_case(singularize(table)),
            Target::Rust => singularize(table).to_camel_case(),
        }
    }

    pub fn file_name(&self, class_name: &str) -> String {
        match self {
            Target::Typescript => format!("{}.ts", class_name),
            Target::Javascript => format!("{}.js", class_name),
            Target::Rust => format!("{}.rs", class_name.to_snake_case()),
        }
    }

    pub fn render(&self, spec: &ModelSpec) -> String {
        match self {
            Target::Typescript => typescript::render(spec),
            Target::Javascript => javascript::render(spec),
            Target::Rust => rust::render(spec),
        }
    }
}

impl std::str::FromStr for Target {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "typescript" | "ts" => Ok(Target::Typescript),
            "javascript" | "js" => Ok(Target::Javascript),
            "rust" | "rs" => Ok(Target::Rust),
            other => Err(format!("unknown target '{}', expected typescript, javascript or rust", other)),
        }
    }
}

/// Single-quoted JavaScript string literal
pub fn js_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Double-quoted string literal, valid in both JavaScript and TypeScript
pub fn json_string(s: &str) -> String {
    serde_json::Value::from(s).to_string()
}

/// How a renderer spells column defaults
pub(crate) struct DefaultSyntax {
    pub now: &'static str,
    /// Function taking raw SQL, `Sequelize.literal`
    pub literal: &'static str,
    pub quote: fn(&str) -> String,
}

/// Literal for a column default, `None` when the database fills it in
pub(crate) fn default_literal(default: &DefaultValue, syntax: &DefaultSyntax) -> Option<String> {
    match default {
        DefaultValue::Sequence => None,
        DefaultValue::Now => Some(syntax.now.to_string()),
        DefaultValue::Boolean(b) => Some(b.to_string()),
        DefaultValue::Number(n) => Some(n.clone()),
        DefaultValue::Text(t) => Some((syntax.quote)(t)),
        DefaultValue::Expression(sql) => Some(format!("{}({})", syntax.literal, js_string(sql))),
    }
}

/// Body lines of the `/** ... */` banner opening each generated file
pub(crate) fn banner(out: &mut String, title: &str, lines: &[String], generated_at: Option<DateTime<Utc>>) {
    out.push_str("/**\n");
    out.push_str(&format!(" * {}\n", title));
    for line in lines {
        if line.is_empty() {
            out.push_str(" *\n");
        } else {
            out.push_str(&format!(" * {}\n", line));
        }
    }
    if let Some(ts) = generated_at {
        out.push_str(&format!(" * Generated: {}\n", ts.to_rfc3339_opts(SecondsFormat::Millis, true)));
    }
    out.push_str(" */\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn js_strings_are_escaped() {
        assert_eq!(js_string("it's"), r"'it\'s'");
        assert_eq!(js_string(r"a\b"), r"'a\\b'");
        assert_eq!(json_string("say \"hi\""), r#""say \"hi\"""#);
    }

    #[test]
    fn default_literals() {
        let syntax = DefaultSyntax {
            now: "Sequelize.NOW",
            literal: "Sequelize.literal",
            quote: json_string,
        };
        let literal = |d: DefaultValue| default_literal(&d, &syntax);
        assert_eq!(literal(DefaultValue::Sequence), None);
        assert_eq!(literal(DefaultValue::Now).as_deref(), Some("Sequelize.NOW"));
        assert_eq!(literal(DefaultValue::Text("12".to_string())).as_deref(), Some(r#""12""#));
        assert_eq!(literal(DefaultValue::Number("12".to_string())).as_deref(), Some("12"));
        assert_eq!(
            literal(DefaultValue::Expression("gen_random_uuid()".to_string())).as_deref(),
            Some("Sequelize.literal('gen_random_uuid()')")
        );
    }

    #[test]
    fn targets() {
        assert_eq!("ts".parse::<Target>(), Ok(Target::Typescript));
        assert_eq!("rust".parse::<Target>(), Ok(Target::Rust));
        assert!("cobol".parse::<Target>().is_err());
        assert_eq!(Target::Rust.file_name("CourseTeacher"), "course_teacher.rs");
        assert_eq!(Target::Javascript.class_name("course_teachers"), "CourseTeacher");
    }
}
