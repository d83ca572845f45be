//! Document store side: collection initialization and rollback.
//!
//! A collection is created with a `$jsonSchema` validator and descending
//! indexes on its timestamps, or dropped again.

use mongodb::bson::{self, doc, Document};
use mongodb::options::{CreateCollectionOptions, IndexOptions};
use mongodb::sync::{Client, Database};
use mongodb::IndexModel;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// Indexes every collection gets, field and direction
pub const TIMESTAMP_INDEXES: &[(&str, i32)] = &[("createdAt", -1), ("updatedAt", -1)];

#[derive(Debug, Clone, PartialEq)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

/// Which way a collection migration goes
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Direction {
    Up,
    Down,
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            other => Err(format!("unknown direction '{}', expected up or down", other)),
        }
    }
}

/// Everything needed to create one collection
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionInit {
    pub name: String,
}

impl CollectionInit {
    pub fn new(name: &str) -> Self {
        CollectionInit { name: name.to_string() }
    }

    /// The `$jsonSchema` validator, as plain JSON
    pub fn validator_json(&self) -> serde_json::Value {
        json!({
            "$jsonSchema": {
                "bsonType": "object",
                "required": ["_id"],
                "properties": {
                    "_id": {
                        "bsonType": "objectId",
                        "description": format!("Primary key for {}", self.name),
                    },
                    "createdAt": {
                        "bsonType": "date",
                        "description": "Document creation timestamp",
                    },
                    "updatedAt": {
                        "bsonType": "date",
                        "description": "Document last update timestamp",
                    },
                },
            },
        })
    }

    pub fn validator(&self) -> Result<Document> {
        Ok(bson::to_document(&self.validator_json())?)
    }

    /// Index names, `<collection>_created_at_desc` and so on
    pub fn index_names(&self) -> Vec<String> {
        TIMESTAMP_INDEXES
            .iter()
            .map(|(field, direction)| {
                let order = if *direction < 0 { "desc" } else { "asc" };
                format!("{}_{}_{}", self.name, crate::naming::to_snake_case(field), order)
            })
            .collect()
    }

    pub fn indexes(&self) -> Vec<IndexModel> {
        TIMESTAMP_INDEXES
            .iter()
            .zip(self.index_names())
            .map(|((field, direction), name)| {
                let mut keys = Document::new();
                keys.insert(*field, *direction);
                IndexModel::builder()
                    .keys(keys)
                    .options(IndexOptions::builder().name(name).build())
                    .build()
            })
            .collect()
    }

    /// What `up` would send, for dry runs
    pub fn describe(&self) -> Result<String> {
        let description = json!({
            "create": self.name,
            "validator": self.validator_json(),
            "indexes": TIMESTAMP_INDEXES
                .iter()
                .zip(self.index_names())
                .map(|((field, direction), name)| {
                    let mut key = serde_json::Map::new();
                    key.insert(field.to_string(), json!(direction));
                    json!({ "key": key, "name": name })
                })
                .collect::<Vec<_>>(),
        });
        Ok(serde_json::to_string_pretty(&description)?)
    }
}

/// Open the configured database; the client lives as long as the returned handle
pub fn connect(config: &MongoConfig) -> Result<Database> {
    let client = Client::with_uri_str(&config.uri)?;
    debug!(database = %config.database, "connected to MongoDB");
    Ok(client.database(&config.database))
}

fn exists(db: &Database, name: &str) -> Result<bool> {
    let names = db.list_collection_names(doc! { "name": name })?;
    Ok(names.iter().any(|n| n == name))
}

/// Create the collection with its validator and indexes
pub fn up(db: &Database, init: &CollectionInit) -> Result<()> {
    if exists(db, &init.name)? {
        return Err(Error::AlreadyExists(format!("collection '{}'", init.name)));
    }

    let options = CreateCollectionOptions::builder().validator(init.validator()?).build();
    db.create_collection(&init.name, options)?;
    info!(collection = %init.name, "created collection");

    let collection = db.collection::<Document>(&init.name);
    let indexed = collection.create_indexes(init.indexes(), None).map_err(Error::from);
    undo_on_error(indexed, &init.name, || Ok(collection.drop(None)?))?;
    info!(collection = %init.name, indexes = ?init.index_names(), "created indexes");
    Ok(())
}

/// Run `undo` when `result` failed, so a half-created collection doesn't stay behind.
/// The original error is kept; a failing undo is only logged.
fn undo_on_error<T>(result: Result<T>, name: &str, undo: impl FnOnce() -> Result<()>) -> Result<T> {
    if result.is_err() {
        match undo() {
            Ok(()) => warn!(collection = %name, "index creation failed, dropped the collection again"),
            Err(e) => warn!(collection = %name, "index creation failed and the collection could not be dropped: {}", e),
        }
    }
    result
}

/// Drop the collection
pub fn down(db: &Database, name: &str) -> Result<()> {
    if !exists(db, name)? {
        return Err(Error::NotFound(format!("collection '{}'", name)));
    }

    db.collection::<Document>(name).drop(None)?;
    info!(collection = %name, "dropped collection");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validator_requires_id_and_types_timestamps() {
        let init = CollectionInit::new("book");
        let validator = init.validator().unwrap();
        let schema = validator.get_document("$jsonSchema").unwrap();
        assert_eq!(schema.get_str("bsonType").unwrap(), "object");
        let properties = schema.get_document("properties").unwrap();
        assert_eq!(properties.get_document("createdAt").unwrap().get_str("bsonType").unwrap(), "date");
        assert_eq!(
            properties.get_document("_id").unwrap().get_str("description").unwrap(),
            "Primary key for book"
        );
    }

    #[test]
    fn default_indexes() {
        let init = CollectionInit::new("book");
        assert_eq!(init.index_names(), vec!["book_created_at_desc", "book_updated_at_desc"]);
        assert_eq!(init.indexes().len(), 2);
    }

    #[test]
    fn dry_run_description_is_json() {
        let described = CollectionInit::new("book").describe().unwrap();
        let value: serde_json::Value = serde_json::from_str(&described).unwrap();
        assert_eq!(value["create"], "book");
        assert_eq!(value["indexes"][0]["key"]["createdAt"], -1);
    }

    #[test]
    fn failed_index_creation_is_undone() {
        let mut undone = 0;
        let result: Result<()> = undo_on_error(Err(Error::Validation("no indexes".to_string())), "book", || {
            undone += 1;
            Ok(())
        });
        match result {
            Err(Error::Validation(msg)) => assert_eq!(msg, "no indexes"),
            other => panic!("expected the original error, got {:?}", other),
        }
        assert_eq!(undone, 1);

        // a failing undo doesn't hide the original error either
        let result: Result<()> = undo_on_error(Err(Error::Validation("no indexes".to_string())), "book", || {
            Err(Error::NotFound("collection 'book'".to_string()))
        });
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn nothing_is_undone_on_success() {
        let mut undone = 0;
        let result = undo_on_error(Ok(3), "book", || {
            undone += 1;
            Ok(())
        });
        assert_eq!(result.unwrap(), 3);
        assert_eq!(undone, 0);
    }

    #[test]
    fn directions() {
        assert_eq!("up".parse::<Direction>(), Ok(Direction::Up));
        assert!("sideways".parse::<Direction>().is_err());
    }
}
