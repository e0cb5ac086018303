//! authkit - command-line access to the authentication primitives
//!
//! Uses `anyhow` for startup errors. Verification failures are not errors:
//! they print a JSON verdict and exit with status 1.

use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use kernel::id::{ObjectIdGenerator, is_valid_id};
use platform::config::PrimitivesConfig;
use platform::password::{self, DEFAULT_SALT_LENGTH};
use platform::token::{self, Claims, SignOptions};
use serde::Serialize;
use serde_json::{Value, json};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "authkit", version, about = "Password digests, signed tokens and ObjectIds")]
struct Cli {
    /// Fall back to a random token secret when TOKEN_SECRET is unset
    #[arg(long, global = true)]
    dev: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Digest a password under a given salt
    Hash {
        #[arg(long)]
        password: String,
        #[arg(long)]
        salt: String,
    },
    /// Digest a password under a fresh salt
    Compose {
        #[arg(long)]
        password: String,
        #[arg(long, default_value_t = DEFAULT_SALT_LENGTH)]
        salt_length: usize,
    },
    /// Check a password against a stored digest and salt
    VerifyPassword {
        #[arg(long)]
        password: String,
        #[arg(long)]
        hash: String,
        #[arg(long)]
        salt: String,
    },
    /// Print a random alphanumeric salt
    Salt {
        #[arg(long, default_value_t = DEFAULT_SALT_LENGTH)]
        length: usize,
    },
    /// Sign a JSON object
    Sign {
        /// Claims as a JSON object
        #[arg(long, default_value = "{}")]
        claims: String,
        /// Lifetime in seconds (defaults to TOKEN_TTL_SECS)
        #[arg(long, allow_hyphen_values = true, conflicts_with = "no_expiry")]
        expires_in: Option<i64>,
        /// Issue a token without an `exp` claim
        #[arg(long)]
        no_expiry: bool,
    },
    /// Verify a token and print its claims
    Verify { token: String },
    /// Print a token's claims without verifying it
    Decode { token: String },
    /// Generate identifiers
    Id {
        #[arg(long, default_value_t = 1)]
        count: usize,
    },
    /// Check an identifier's shape
    ValidateId { id: String },
    /// Print a fresh base64 value for TOKEN_SECRET
    Secret,
}

fn main() -> anyhow::Result<ExitCode> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing (stderr, so stdout stays machine readable)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "authkit=info,platform=info,kernel=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    run(cli)
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.command {
        Command::Hash { password, salt } => {
            print_json(&json!({ "hash": password::hash(&password, &salt) }))?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Compose {
            password,
            salt_length,
        } => {
            let credential = password::compose_hash_with(&mut rand::rng(), &password, salt_length);
            print_json(&credential)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::VerifyPassword {
            password,
            hash,
            salt,
        } => {
            let valid = password::verify_password(&password, &hash, &salt);
            print_json(&json!({ "valid": valid }))?;
            Ok(verdict(valid))
        }
        Command::Salt { length } => {
            print_json(&json!({ "salt": password::generate_salt(length) }))?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Sign {
            claims,
            expires_in,
            no_expiry,
        } => {
            let config = load_config(cli.dev)?;
            let claims = parse_claims(&claims)?;
            let options = match (expires_in, no_expiry) {
                (_, true) => SignOptions::default(),
                (Some(seconds), false) => SignOptions::expires_in(seconds),
                (None, false) => config.default_sign_options(),
            };
            let token = token::sign(&claims, config.secret(), options);
            tracing::info!(expires_in = ?options.expires_in, "Issued token");
            print_json(&json!({ "token": token }))?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Verify { token } => {
            let config = load_config(cli.dev)?;
            let claims = token::verify(&token, config.secret());
            let valid = claims.is_some();
            print_json(&json!({ "valid": valid, "claims": claims }))?;
            Ok(verdict(valid))
        }
        Command::Decode { token } => {
            let claims = token::decode(&token);
            let decoded = claims.is_some();
            print_json(&json!({ "claims": claims }))?;
            Ok(verdict(decoded))
        }
        Command::Id { count } => {
            let generator = ObjectIdGenerator::new();
            let ids: Vec<_> = (0..count).map(|_| generator.generate()).collect();
            print_json(&json!({ "ids": ids }))?;
            Ok(ExitCode::SUCCESS)
        }
        Command::ValidateId { id } => match is_valid_id(&id) {
            Ok(id) => {
                print_json(&json!({ "success": true, "id": id }))?;
                Ok(ExitCode::SUCCESS)
            }
            Err(err) => {
                print_json(&err.report())?;
                Ok(ExitCode::FAILURE)
            }
        },
        Command::Secret => {
            let config = PrimitivesConfig::with_random_secret();
            print_json(&json!({ "TOKEN_SECRET": config.secret_base64() }))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_config(dev: bool) -> anyhow::Result<PrimitivesConfig> {
    let config = if dev {
        PrimitivesConfig::development()
    } else {
        PrimitivesConfig::from_env()
    };
    config.context("Failed to load token configuration")
}

fn parse_claims(raw: &str) -> anyhow::Result<Claims> {
    match serde_json::from_str::<Value>(raw).context("Claims must be valid JSON")? {
        Value::Object(claims) => Ok(claims),
        other => anyhow::bail!("Claims must be a JSON object, got {}", other),
    }
}

fn verdict(ok: bool) -> ExitCode {
    if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
