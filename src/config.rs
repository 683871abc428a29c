//! Server configuration and CLI argument parsing
//!
//! Settings come from command-line arguments with environment variable
//! fallbacks, handled by clap.
//!
//! # Configuration Priority
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables
//! 3. Default values (lowest priority)
//!
//! # Example Usage
//!
//! ```bash
//! # Using environment variables
//! export API_KEY=s3cret
//! export PORT=9090
//! quotecrab
//!
//! # Mixed (CLI overrides env)
//! export PORT=8080
//! quotecrab --port 9090 --quotes-file ./quotes.txt  # Uses port 9090
//! ```

use anyhow::{Result, anyhow};
use clap::Parser;
use std::path::PathBuf;

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Main configuration structure for the server
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP transport configuration
    pub http: HttpConfig,
    /// Tab-separated quote file loaded at startup
    pub quotes_file: PathBuf,
    /// Shared secret expected in the `X-API-Key` header
    pub api_key: Option<String>,
    /// Logging level (error, warn, info, debug, trace)
    pub log_level: String,
}

/// HTTP transport configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Host address to bind to (e.g., "0.0.0.0")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

/// Command-line arguments for the server
///
/// # Examples
///
/// ```bash
/// quotecrab --quotes-file ./misc/author-quote.txt --port 8080
/// quotecrab --host 127.0.0.1 --log-level debug
/// ```
#[derive(Parser, Debug)]
#[command(
    name = "quotecrab",
    about = "Quote server that never repeats a quote to a client within a day",
    long_about = "Serves quotes over HTTP. Requests identified by a clientId receive each quote at most once per day; history resets at local midnight.\n\nEnvironment variables are supported. CLI arguments take precedence over environment variables."
)]
pub struct Args {
    #[arg(
        long,
        value_name = "HOST",
        help = "HTTP host",
        default_value = "0.0.0.0",
        env = "QUOTECRAB_HOST"
    )]
    pub host: String,
    #[arg(
        long,
        value_name = "PORT",
        help = "HTTP port",
        default_value_t = 8080,
        env = "PORT"
    )]
    pub port: u16,

    #[arg(
        long,
        value_name = "PATH",
        help = "Tab-separated author/quote file",
        default_value = "./misc/author-quote.txt",
        env = "QUOTECRAB_QUOTES_FILE"
    )]
    pub quotes_file: PathBuf,

    #[arg(
        long,
        value_name = "KEY",
        help = "Shared secret required in the X-API-Key header",
        env = "API_KEY",
        hide_env_values = true
    )]
    pub api_key: Option<String>,

    #[arg(
        long,
        value_name = "LEVEL",
        help = "Log level: error, warn, info, debug, trace",
        default_value = "info",
        env = "QUOTECRAB_LOG_LEVEL"
    )]
    pub log_level: String,

    // Utility options
    #[arg(
        long,
        help = "List all environment variables and exit",
        action = clap::ArgAction::SetTrue
    )]
    pub list_env_vars: bool,
}

impl Config {
    /// Build configuration from environment variables and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting configuration is invalid.
    pub fn from_env_and_args() -> Result<Self> {
        let args = Args::parse();

        if args.list_env_vars {
            Self::print_env_vars();
            std::process::exit(0);
        }

        Self::from_args(args)
    }

    /// Build and validate configuration from already parsed arguments
    pub fn from_args(args: Args) -> Result<Self> {
        let config = Config {
            http: HttpConfig {
                host: args.host,
                port: args.port,
            },
            quotes_file: args.quotes_file,
            api_key: args.api_key,
            log_level: args.log_level.to_lowercase(),
        };

        config.validate()?;

        Ok(config)
    }

    /// Whether a non-empty shared secret is configured
    ///
    /// Without one the server still starts, but rejects every gated request.
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|key| !key.is_empty())
    }

    fn validate(&self) -> Result<()> {
        if self.quotes_file.as_os_str().is_empty() {
            return Err(anyhow!("The quotes file path must not be empty"));
        }

        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(anyhow!(
                "Invalid log level: {}. Valid options are: {}",
                self.log_level,
                LOG_LEVELS.join(", ")
            ));
        }

        Ok(())
    }

    /// Print all available environment variables and their descriptions
    fn print_env_vars() {
        println!("QuoteCrab Environment Variables");
        println!("===============================");
        println!();
        println!("CLI arguments take precedence over environment variables.");
        println!();

        println!("Server Configuration:");
        println!("  QUOTECRAB_HOST=<host>                 HTTP host [default: 0.0.0.0]");
        println!("  PORT=<port>                           HTTP port [default: 8080]");
        println!();

        println!("Quotes:");
        println!(
            "  QUOTECRAB_QUOTES_FILE=<path>          Tab-separated quote file [default: ./misc/author-quote.txt]"
        );
        println!();

        println!("Access:");
        println!(
            "  API_KEY=<secret>                      Shared secret for the X-API-Key header (required; unset rejects all requests)"
        );
        println!();

        println!("General Configuration:");
        println!(
            "  QUOTECRAB_LOG_LEVEL=<level>           Log level: error, warn, info, debug, trace [default: info]"
        );
        println!();

        println!("Examples:");
        println!("  export API_KEY=s3cret");
        println!("  export PORT=9090");
        println!("  quotecrab --port 7070  # Will use port 7070, not 9090");
    }
}
