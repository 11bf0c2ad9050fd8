use clap::{Args, Parser, Subcommand};

use tablerest::DatabaseConfig;
use tablerest::constants::{DEFAULT_ADDRESS, ENV_DATABASE_DSN, ENV_DATABASE_PASS, ENV_DATABASE_USER};

/// Command line arguments for tablerest's CLI.
///
/// Database credentials are read from the environment unless given explicitly.
#[derive(Parser, Debug, Clone, Default)]
#[command(version, about, long_about = None)]
pub struct DefaultCommandLineArgs {
  /// Database DSN, e.g. "sqlite:./main.db" or "sqlite::memory:".
  #[arg(long, env = ENV_DATABASE_DSN)]
  pub dsn: Option<String>,

  #[arg(long, env = ENV_DATABASE_USER)]
  pub user: Option<String>,

  #[arg(long, env = ENV_DATABASE_PASS, hide_env_values = true)]
  pub password: Option<String>,

  #[command(subcommand)]
  pub cmd: Option<SubCommands>,
}

impl DefaultCommandLineArgs {
  pub fn database_config(&self) -> DatabaseConfig {
    return DatabaseConfig {
      dsn: self.dsn.clone(),
      user: self.user.clone(),
      password: self.password.clone(),
    };
  }
}

#[derive(Subcommand, Debug, Clone)]
pub enum SubCommands {
  /// Starts the HTTP server.
  Run(ServerArgs),
  /// Executes a single SQL statement and prints the resulting rows as JSON.
  Query {
    sql: String,

    /// Positional statement parameters. Parsed as JSON if possible, e.g. `42` or `null`, and
    /// passed as text otherwise.
    #[arg(long)]
    param: Vec<String>,
  },
}

#[derive(Args, Clone, Debug)]
pub struct ServerArgs {
  /// Name of the table to expose at /api/v1/<table>.
  #[arg(short, long, env)]
  pub table: String,

  /// Authority (<host>:<port>) the HTTP server binds to (Default: localhost:4000).
  #[arg(short, long, env, default_value = DEFAULT_ADDRESS)]
  pub address: String,

  /// Use permissive CORS to allow for cross-origin requests during development.
  #[arg(long)]
  pub dev: bool,

  #[arg(long, default_value_t = false)]
  pub stderr_logging: bool,

  /// Limit the set of allowed origins the HTTP server will answer to.
  #[arg(long, default_value = "*")]
  pub cors_allowed_origins: Vec<String>,
}
