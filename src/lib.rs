#[macro_use]
extern crate quick_error;

#[macro_use]
extern crate serde;

pub mod error;
pub mod introspect;
pub mod mapping;
pub mod model;
pub mod mongo;
pub mod naming;
pub mod output;
pub mod render;
pub mod types;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

pub use error::{Error, Result};
pub use naming::Identifier;
pub use output::{Artifact, OverwritePolicy};
pub use render::Target;

/// How to generate a model from a table
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub schema: String,
    pub target: Target,
    pub generated_at: Option<DateTime<Utc>>,
}

/// A rendered model together with the description it came from
#[derive(Debug, Clone)]
pub struct GeneratedModel {
    pub spec: types::ModelSpec,
    pub artifact: Artifact,
}

// Run the transformation
pub fn generate_model(
    conn_config: &postgres::Config,
    table: &Identifier,
    options: &GenerateOptions,
) -> Result<GeneratedModel> {
    // Connect to the database
    let client = conn_config.connect(postgres::NoTls).map_err(Error::Connection)?;
    generate_model_with(client, table, options)
}

/// Introspect `table` over an open session and render its model.
///
/// The session is closed whatever the outcome of introspection; a failure to
/// close is only logged.
pub fn generate_model_with<S: introspect::Session>(
    mut session: S,
    table: &Identifier,
    options: &GenerateOptions,
) -> Result<GeneratedModel> {
    info!(table = %table, schema = %options.schema, "analyzing table");
    let metadata = introspect::run(&mut session, &options.schema, table);
    if let Err(e) = session.close() {
        warn!("error while closing the connection: {}", e);
    }
    let metadata = metadata?;

    let mapper = mapping::TypeMapper::builtin()?;
    Ok(render_model(&metadata, &mapper, options))
}

/// Render the model of already introspected metadata
pub fn render_model(
    metadata: &types::TableMetadata,
    mapper: &mapping::TypeMapper,
    options: &GenerateOptions,
) -> GeneratedModel {
    let spec = model::build(metadata, mapper, options.target, options.generated_at);
    let artifact = Artifact {
        file_name: options.target.file_name(&spec.class_name),
        contents: options.target.render(&spec),
    };
    GeneratedModel { spec, artifact }
}

/// Mongoose model scaffold for a collection
pub fn mongoose_model(collection: &Identifier, generated_at: Option<DateTime<Utc>>) -> Artifact {
    Artifact {
        file_name: render::mongoose::file_name(collection),
        contents: render::mongoose::render(collection, generated_at),
    }
}

/// Sequelize migration scaffold creating a table
pub fn migration(table: &Identifier, at: DateTime<Utc>, stamp_contents: bool) -> Artifact {
    let columns = render::migration::starter_columns(table);
    let generated_at = if stamp_contents { Some(at) } else { None };
    Artifact {
        file_name: render::migration::file_name(table, at),
        contents: render::migration::render(table, &columns, generated_at),
    }
}

/// Create or drop a collection
pub fn mongo_migrate(config: &mongo::MongoConfig, direction: mongo::Direction, collection: &Identifier) -> Result<()> {
    let db = mongo::connect(config)?;
    match direction {
        mongo::Direction::Up => mongo::up(&db, &mongo::CollectionInit::new(collection)),
        mongo::Direction::Down => mongo::down(&db, collection),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspect::tests::course_catalog;

    #[test]
    fn renders_from_metadata() {
        let mut catalog = course_catalog();
        let metadata = introspect::run(&mut catalog, "public", "course").unwrap();
        let generated = render_model(&metadata, &mapping::TypeMapper::builtin().unwrap(), &options());
        assert_eq!(generated.artifact.file_name, "course.ts");
        assert_eq!(generated.spec.fields.len(), 3);
        assert!(generated.artifact.contents.contains("export default course;"));
    }

    fn options() -> GenerateOptions {
        GenerateOptions {
            schema: "public".to_string(),
            target: Target::Typescript,
            generated_at: None,
        }
    }

    #[test]
    fn session_is_closed_after_success() {
        let catalog = course_catalog();
        let closes = catalog.closes.clone();
        let table = Identifier::parse("course").unwrap();
        let generated = generate_model_with(catalog, &table, &options()).unwrap();
        assert_eq!(generated.artifact.file_name, "course.ts");
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn session_is_closed_when_the_table_is_missing() {
        let catalog = course_catalog();
        let closes = catalog.closes.clone();
        let table = Identifier::parse("nope").unwrap();
        match generate_model_with(catalog, &table, &options()) {
            Err(Error::NotFound(what)) => assert!(what.contains("nope")),
            other => panic!("expected NotFound, got {:?}", other),
        }
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn scaffold_artifacts_are_named_after_their_source() {
        let collection = Identifier::parse("borrow_records").unwrap();
        assert_eq!(mongoose_model(&collection, None).file_name, "BorrowRecord.js");

        let table = Identifier::parse("students").unwrap();
        let at = DateTime::parse_from_rfc3339("2025-08-17T16:37:41Z").unwrap().with_timezone(&Utc);
        let artifact = migration(&table, at, false);
        assert_eq!(artifact.file_name, "20250817163741-create-students.js");
        assert!(!artifact.contents.contains("Generated:"));
        assert!(migration(&table, at, true).contents.contains(" * Generated: 2025-08-17T16:37:41.000Z\n"));
    }
}
