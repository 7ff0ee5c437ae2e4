//! Identity provider administration CLI.
//!
//! Produces client secret material for the catalog file and manages users
//! directly in the configured user store.
//!
//! ## Usage Examples
//!
//! ```bash
//! # Hash an existing secret for a catalog entry
//! idp-admin hash-secret --secret "s3cret"
//!
//! # Generate a fresh secret together with its catalog hash
//! idp-admin --format json-pretty generate-secret
//!
//! # Create a user in a SQLite store
//! idp-admin --storage-backend sqlite --database-url sqlite:idp.db?mode=rwc \
//!   create-user --username bob --email bob@example.com --password 'CorrectPass1!'
//!
//! # List users
//! idp-admin --storage-backend sqlite list-users --limit 20
//! ```
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Storage error
//! - 3: Validation error

use clap::{Args, Parser, Subcommand, ValueEnum};
use idp::{
    accounts::{Argon2PasswordHasher, PasswordPolicy, UserManager, validate_account_fields},
    config::PasswordHashingParams,
    errors::StorageError,
    oauth::{SecretHash, types::generate_token},
    storage::{StorageBackend, create_user_store, parse_storage_backend},
};
use serde::Serialize;
use serde_json::{Value, json};
use std::process;
use std::sync::Arc;

/// Main CLI application structure
#[derive(Parser)]
#[command(
    name = "idp-admin",
    about = "Identity provider administration tool",
    version = env!("CARGO_PKG_VERSION")
)]
struct Cli {
    /// User storage backend; user commands need `sqlite` or `postgres`
    #[arg(long, env = "STORAGE_BACKEND", default_value = "sqlite")]
    storage_backend: String,

    /// Database connection string for SQL backends
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Argon2 cost parameters as memory_kib,iterations,parallelism
    #[arg(long, env = "PASSWORD_HASHING_PARAMS", default_value = "19456,2,1")]
    password_hashing_params: String,

    /// Minimum password length for created users
    #[arg(long, env = "PASSWORD_MIN_LENGTH", default_value_t = 8)]
    password_min_length: usize,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "json")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

/// Output format options
#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    /// JSON formatted output
    Json,
    /// Pretty-printed JSON output
    JsonPretty,
    /// Human-readable key/value output
    Table,
}

/// Available CLI commands
#[derive(Subcommand)]
enum Commands {
    /// Print the catalog `secret_hash` for a client secret
    HashSecret(HashSecretArgs),
    /// Generate a random client secret and its catalog hash
    GenerateSecret,
    /// Create a user in the configured store
    CreateUser(CreateUserArgs),
    /// List users in the configured store
    ListUsers(ListUsersArgs),
}

#[derive(Args)]
struct HashSecretArgs {
    /// Plaintext client secret
    #[arg(long, env = "IDP_CLIENT_SECRET")]
    secret: String,
}

#[derive(Args)]
struct CreateUserArgs {
    #[arg(long)]
    username: String,

    #[arg(long)]
    email: String,

    #[arg(long, env = "IDP_USER_PASSWORD")]
    password: String,
}

#[derive(Args)]
struct ListUsersArgs {
    /// Maximum number of users to print
    #[arg(long)]
    limit: Option<usize>,
}

/// Application errors
#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Error: {0}")]
    General(String),
}

/// Main application entry point
#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::HashSecret(args) => hash_secret(&cli, args),
        Commands::GenerateSecret => generate_secret(&cli),
        Commands::CreateUser(args) => create_user(&cli, args).await,
        Commands::ListUsers(args) => list_users(&cli, args).await,
    };

    if let Err(err) = result {
        eprintln!("{}", err);
        let code = match err {
            AppError::Json(_) | AppError::General(_) => 1,
            AppError::Storage(_) => 2,
            AppError::Validation(_) => 3,
        };
        process::exit(code);
    }
}

fn hash_secret(cli: &Cli, args: &HashSecretArgs) -> Result<(), AppError> {
    let hash = SecretHash::of(&args.secret);
    output_response(&cli.format, &json!({ "secret_hash": hash }))
}

fn generate_secret(cli: &Cli) -> Result<(), AppError> {
    let secret = generate_token();
    let hash = SecretHash::of(&secret);
    output_response(
        &cli.format,
        &json!({
            "client_secret": secret,
            "secret_hash": hash,
        }),
    )
}

async fn user_manager(cli: &Cli) -> Result<UserManager, AppError> {
    let params: PasswordHashingParams = cli
        .password_hashing_params
        .clone()
        .try_into()
        .map_err(|e: anyhow::Error| AppError::General(e.to_string()))?;
    let hasher = Argon2PasswordHasher::new(&params).map_err(|e| AppError::General(e.to_string()))?;

    let backend = parse_storage_backend(&cli.storage_backend, cli.database_url.as_deref())?;
    if backend == StorageBackend::Memory {
        return Err(AppError::Validation(
            "create-user and list-users need STORAGE_BACKEND=sqlite or postgres".to_string(),
        ));
    }
    if cli.verbose {
        eprintln!("Using storage backend: {:?}", backend);
    }
    let store = create_user_store(backend).await?;

    Ok(UserManager::new(store, Arc::new(hasher)))
}

async fn create_user(cli: &Cli, args: &CreateUserArgs) -> Result<(), AppError> {
    let policy = PasswordPolicy::new(cli.password_min_length);
    let errors = validate_account_fields(&args.username, &args.email, &args.password, &policy);
    if !errors.is_empty() {
        let messages: Vec<_> = errors.into_iter().map(|e| e.message).collect();
        return Err(AppError::Validation(messages.join(" ")));
    }

    let users = user_manager(cli).await?;
    let user = users
        .create(&args.username, &args.email, &args.password)
        .await?;
    output_response(&cli.format, &user)
}

async fn list_users(cli: &Cli, args: &ListUsersArgs) -> Result<(), AppError> {
    let users = user_manager(cli).await?;
    let users = users.list_users(args.limit).await?;
    output_response(&cli.format, &users)
}

/// Output response data in the requested format
fn output_response<T: Serialize>(format: &OutputFormat, data: &T) -> Result<(), AppError> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string(data)?);
        }
        OutputFormat::JsonPretty => {
            println!("{}", serde_json::to_string_pretty(data)?);
        }
        OutputFormat::Table => {
            let json_value: Value = serde_json::to_value(data)?;
            print_table(&json_value, 0);
        }
    }
    Ok(())
}

/// Print data in table format (recursive for nested objects)
fn print_table(value: &Value, indent: usize) {
    let prefix = "  ".repeat(indent);

    match value {
        Value::Object(map) => {
            for (key, val) in map {
                match val {
                    Value::Object(_) => {
                        println!("{}{}:", prefix, key);
                        print_table(val, indent + 1);
                    }
                    Value::Array(arr) => {
                        println!("{}{}:", prefix, key);
                        for (i, item) in arr.iter().enumerate() {
                            println!("{}  [{}]:", prefix, i);
                            print_table(item, indent + 2);
                        }
                    }
                    _ => {
                        println!("{}{}: {}", prefix, key, format_value(val));
                    }
                }
            }
        }
        Value::Array(arr) => {
            for (i, item) in arr.iter().enumerate() {
                println!("{}[{}]:", prefix, i);
                print_table(item, indent + 1);
            }
        }
        _ => {
            println!("{}{}", prefix, format_value(value));
        }
    }
}

/// Format a JSON value for display
fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_else(|_| "invalid".to_string()),
    }
}
