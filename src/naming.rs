//! Naming conventions shared by every generator.
//!
//! Database objects use snake_case, JavaScript properties camelCase and class
//! names PascalCase. The converters only touch the characters they are about:
//! anything else passes through unchanged.

use derive_deref::Deref;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};

/// Names accepted for tables and collections
pub const IDENTIFIER_PATTERN: &str = r"^[a-zA-Z_][a-zA-Z0-9_]*$";

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(IDENTIFIER_PATTERN).expect("identifier pattern is valid"));

/// A validated table or collection name
#[derive(Debug, Clone, PartialEq, Eq, Deref)]
pub struct Identifier(String);

impl Identifier {
    pub fn parse(name: &str) -> Result<Self> {
        if IDENTIFIER.is_match(name) {
            Ok(Identifier(name.to_string()))
        } else {
            Err(Error::Validation(format!(
                "invalid name '{}', use only letters, numbers, and underscores",
                name
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for Identifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Identifier::parse(s)
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// `student_id` -> `studentId`
pub fn to_camel_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, chars.peek()) {
            ('_', Some(next)) if next.is_ascii_lowercase() => {
                out.push(next.to_ascii_uppercase());
                chars.next();
            }
            _ => out.push(c),
        }
    }
    out
}

/// `course_teacher` -> `CourseTeacher`
pub fn to_pascal_case(s: &str) -> String {
    let camel = to_camel_case(s);
    let mut chars = camel.chars();
    match chars.next() {
        Some(first) if first.is_ascii_lowercase() => first.to_ascii_uppercase().to_string() + chars.as_str(),
        _ => camel,
    }
}

/// `courseTeacher` -> `course_teacher`
pub fn to_snake_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for c in s.chars() {
        if c.is_ascii_uppercase() {
            out.push('_');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Naive singular form, one trailing `s` goes away
pub fn singularize(s: &str) -> &str {
    s.strip_suffix('s').unwrap_or(s)
}
