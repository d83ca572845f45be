use std::path::PathBuf;

quick_error! {
    /// Everything that can go wrong during one invocation.
    ///
    /// None of these are retried: each one ends the invocation and is reported
    /// to the user as-is.
    #[derive(Debug)]
    pub enum Error {
        /// Bad user input, nothing was attempted
        Validation(msg: String) {
            display("{}", msg)
        }
        /// The table or collection does not exist
        NotFound(what: String) {
            display("{} not found", what)
        }
        /// The output file or collection is already there
        AlreadyExists(what: String) {
            display("{} already exists", what)
        }
        /// Could not reach the relational database
        Connection(err: postgres::Error) {
            display("cannot connect to PostgreSQL: {}", err)
            source(err)
        }
        /// A catalog query failed after connecting
        Query(err: postgres::Error) {
            display("catalog query failed: {}", err)
            source(err)
            from()
        }
        Mongo(err: mongodb::error::Error) {
            display("MongoDB error: {}", err)
            source(err)
            from()
        }
        Bson(err: mongodb::bson::ser::Error) {
            display("cannot build BSON document: {}", err)
            source(err)
            from()
        }
        /// The built-in type tables could not be parsed
        Mapping(err: ron::Error) {
            display("invalid type mapping table: {}", err)
            source(err)
            from()
        }
        Json(err: serde_json::Error) {
            display("JSON error: {}", err)
            source(err)
            from()
        }
        Io(path: PathBuf, err: std::io::Error) {
            display("cannot write {}: {}", path.display(), err)
            source(err)
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
