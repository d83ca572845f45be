use chrono::{DateTime, Utc};
use clap::error::ErrorKind;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use schema_scaffold::mongo::{CollectionInit, Direction, MongoConfig};
use schema_scaffold::{Artifact, Error, GenerateOptions, Identifier, OverwritePolicy, Result, Target};

#[derive(Parser)]
#[command(name = "schema-scaffold", version, author, about = "Scaffolding for Sequelize and Mongoose projects")]
struct Opts {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a model from an existing PostgreSQL table
    GenerateModel {
        /// Table to introspect
        #[arg(value_parser = parse_identifier)]
        table_name: Identifier,
        /// Schema the table lives in
        #[arg(long, default_value = "public")]
        schema: String,
        /// Kind of model to generate: typescript, javascript or rust
        #[arg(short, long, default_value = "typescript")]
        target: Target,
        /// Output directory
        #[arg(short, long, default_value = "src/orm/models")]
        out_dir: PathBuf,
        #[command(flatten)]
        write: WriteOpts,
        #[command(flatten)]
        db: DbOpts,
    },
    /// Generate a Mongoose model scaffold for a collection
    GenerateMongooseModel {
        /// Collection the model is bound to
        #[arg(value_parser = parse_identifier)]
        collection_name: Identifier,
        /// Output directory
        #[arg(short, long, default_value = "src/odm/models")]
        out_dir: PathBuf,
        #[command(flatten)]
        write: WriteOpts,
    },
    /// Create a sequelize-cli migration for a new table
    CreateMigration {
        /// Table the migration creates
        #[arg(value_parser = parse_identifier)]
        table_name: Identifier,
        /// Output directory
        #[arg(short, long, default_value = "migrations")]
        out_dir: PathBuf,
        #[command(flatten)]
        write: WriteOpts,
    },
    /// Create (up) or drop (down) a MongoDB collection
    MongoMigrate {
        /// up or down
        direction: Direction,
        /// Collection to create or drop
        #[arg(value_parser = parse_identifier)]
        collection_name: Identifier,
        /// Print what would be sent to the server and stop
        #[arg(long)]
        dry_run: bool,
        #[command(flatten)]
        mongo: MongoOpts,
    },
}

#[derive(Args)]
struct WriteOpts {
    /// Replace the file if it already exists
    #[arg(short, long)]
    force: bool,
    /// Print the result instead of writing a file
    #[arg(long)]
    stdout: bool,
    /// Leave the generation timestamp out of the contents
    #[arg(long)]
    no_timestamp: bool,
}

#[derive(Args)]
struct DbOpts {
    /// PostgreSQL connection string, takes precedence over the other connection flags,
    /// for details please refer to https://www.postgresql.org/docs/current/libpq-connect.html#LIBPQ-CONNSTRING
    #[arg(long, env = "DATABASE_URL")]
    url: Option<String>,
    /// PostgreSQL host name
    #[arg(long, env = "DB_HOST", default_value = "localhost")]
    host: String,
    /// PostgreSQL port
    #[arg(short, long, env = "DB_PORT", default_value = "5432")]
    port: u16,
    /// PostgreSQL user name
    #[arg(short, long, env = "DB_USERNAME", default_value = "postgres")]
    user: String,
    /// PostgreSQL password
    #[arg(short = 'w', long, env = "DB_PASSWORD", hide_env_values = true)]
    password: Option<String>,
    /// PostgreSQL database name
    #[arg(short, long, env = "DB_DATABASE", default_value = "student_course_management")]
    dbname: String,
}

#[derive(Args)]
struct MongoOpts {
    /// MongoDB connection string
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017/odm_demo")]
    uri: String,
    /// MongoDB database name
    #[arg(long, env = "MONGO_DB_NAME", default_value = "odm_demo")]
    database: String,
}

fn parse_identifier(s: &str) -> std::result::Result<Identifier, String> {
    Identifier::parse(s).map_err(|e| e.to_string())
}

impl DbOpts {
    // Read the PostgreSQL connection configuration
    fn conn_config(&self) -> Result<postgres::Config> {
        if let Some(url) = &self.url {
            return url.parse().map_err(Error::Connection);
        }
        let mut conn_config = postgres::Config::new();
        conn_config.host(&self.host);
        conn_config.port(self.port);
        conn_config.user(&self.user);
        if let Some(password) = &self.password {
            conn_config.password(password);
        }
        conn_config.dbname(&self.dbname);
        Ok(conn_config)
    }
}

impl WriteOpts {
    fn policy(&self) -> OverwritePolicy {
        if self.force {
            OverwritePolicy::Overwrite
        } else {
            OverwritePolicy::Refuse
        }
    }

    fn stamp(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if self.no_timestamp {
            None
        } else {
            Some(now)
        }
    }

    /// Write the artifact, or print it; returns where it went
    fn emit(&self, artifact: &Artifact, out_dir: &Path) -> Result<Option<PathBuf>> {
        if self.stdout {
            print!("{}", artifact.contents);
            return Ok(None);
        }
        artifact.write_to(out_dir, self.policy()).map(Some)
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    // Parse the program options
    let opts = match Opts::try_parse() {
        Ok(opts) => opts,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(1),
            };
        }
    };

    match run(opts.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::from(1)
        }
    }
}

fn run(command: Command) -> Result<()> {
    let now = Utc::now();
    match command {
        Command::GenerateModel {
            table_name,
            schema,
            target,
            out_dir,
            write,
            db,
        } => {
            let options = GenerateOptions {
                schema,
                target,
                generated_at: write.stamp(now),
            };
            let generated = schema_scaffold::generate_model(&db.conn_config()?, &table_name, &options)?;
            let spec = &generated.spec;
            match write.emit(&generated.artifact, &out_dir)? {
                Some(path) => {
                    println!("Generated {} model for table '{}': {}", spec.class_name, table_name, path.display());
                    println!("  fields: {}", spec.fields.len());
                    let primary_key: Vec<&str> = spec.primary_key().map(|f| f.column.as_str()).collect();
                    println!("  primary key: {}", primary_key.join(", "));
                    println!("  foreign keys: {}", spec.foreign_key_count());
                    println!("  unique fields: {}", spec.unique_fields().count());
                }
                None => info!(class = %spec.class_name, fields = spec.fields.len(), "generated model"),
            }
        }
        Command::GenerateMongooseModel {
            collection_name,
            out_dir,
            write,
        } => {
            let artifact = schema_scaffold::mongoose_model(&collection_name, write.stamp(now));
            if let Some(path) = write.emit(&artifact, &out_dir)? {
                println!("Generated Mongoose model for collection '{}': {}", collection_name, path.display());
            }
        }
        Command::CreateMigration {
            table_name,
            out_dir,
            write,
        } => {
            let artifact = schema_scaffold::migration(&table_name, now, !write.no_timestamp);
            if let Some(path) = write.emit(&artifact, &out_dir)? {
                println!("Created migration for table '{}': {}", table_name, path.display());
                println!("  run it with: npx sequelize-cli db:migrate");
            }
        }
        Command::MongoMigrate {
            direction,
            collection_name,
            dry_run,
            mongo,
        } => {
            if dry_run {
                match direction {
                    Direction::Up => println!("{}", CollectionInit::new(&collection_name).describe()?),
                    Direction::Down => println!("would drop collection '{}'", collection_name),
                }
                return Ok(());
            }
            let config = MongoConfig {
                uri: mongo.uri,
                database: mongo.database,
            };
            schema_scaffold::mongo_migrate(&config, direction, &collection_name)?;
            match direction {
                Direction::Up => println!("Created collection '{}' in '{}'", collection_name, config.database),
                Direction::Down => println!("Dropped collection '{}' from '{}'", collection_name, config.database),
            }
        }
    }
    Ok(())
}
