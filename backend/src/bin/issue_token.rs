#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), forbid(clippy::expect_used))]
//! Mint a bearer token for the student API.
//!
//! The signing secret is read from `STUDENTS_JWT_SECRET`, matching the
//! server's configuration.
//!
//! # Examples
//! ```sh
//! STUDENTS_JWT_SECRET=hush cargo run --bin issue-token -- --sub 1 --email ada@example.com
//! ```

use std::env;
use std::process::ExitCode;

use chrono::Duration;
use clap::Parser;
use students::inbound::http::auth::{DEFAULT_TOKEN_TTL_HOURS, TokenAuthority};

const SECRET_ENV: &str = "STUDENTS_JWT_SECRET";

/// Command-line arguments for the token issuer.
#[derive(Debug, Parser)]
#[command(name = "issue-token", about = "Issue an HS256 bearer token")]
struct CliArgs {
    /// Subject claim, usually the student id.
    #[arg(long)]
    sub: String,
    #[arg(long, default_value = "")]
    email: String,
    #[arg(long, default_value = "")]
    name: String,
    /// Token lifetime in hours.
    #[arg(long, default_value_t = DEFAULT_TOKEN_TTL_HOURS)]
    ttl_hours: i64,
}

fn main() -> ExitCode {
    let args = CliArgs::parse();
    let secret = match env::var(SECRET_ENV) {
        Ok(secret) if !secret.is_empty() => secret,
        _ => {
            eprintln!("{SECRET_ENV} must be set to the server's signing secret");
            return ExitCode::FAILURE;
        }
    };

    let authority = TokenAuthority::new(secret);
    match authority.issue(
        &args.sub,
        &args.email,
        &args.name,
        Duration::hours(args.ttl_hours),
    ) {
        Ok(token) => {
            println!("{token}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("failed to issue token: {err}");
            ExitCode::FAILURE
        }
    }
}
