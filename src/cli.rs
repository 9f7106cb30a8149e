//! Command-line interface definitions for JobScout.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Every option can also come from the environment, which is how container
//! platforms (Railway, Render, Heroku) pass `PORT` and friends.

use clap::Parser;
use clap::builder::BoolishValueParser;

/// Command-line arguments for the JobScout server.
///
/// # Examples
///
/// ```sh
/// # Serve on the platform-assigned port with default engine settings
/// PORT=8080 jobscout
///
/// # Local development with verbose logs and custom engine settings
/// jobscout --debug --environment development --config ./jobscout.yaml
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// Deployment environment reported by `GET /api`
    #[arg(short, long, env = "ENVIRONMENT", default_value = "production")]
    pub environment: String,

    /// Enable debug logging (overridden by RUST_LOG). `DEBUG` accepts
    /// `true`/`false`, `1`/`0`, `yes`/`no` and `on`/`off` in any case.
    #[arg(short, long, env = "DEBUG", value_parser = BoolishValueParser::new())]
    pub debug: bool,

    /// Optional path to a YAML file with engine settings
    #[arg(short, long, env = "JOBSCOUT_CONFIG")]
    pub config: Option<String>,

    /// Directory holding the static frontend
    #[arg(long, env = "STATIC_DIR", default_value = "static")]
    pub static_dir: String,
}
