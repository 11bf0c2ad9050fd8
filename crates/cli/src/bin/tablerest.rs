#![allow(clippy::needless_return)]

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{CommandFactory, Parser};
use std::rc::Rc;
use tablerest::{Database, Server, ServerOptions};
use tablerest_sqlite::Value;

use tablerest_cli::{DefaultCommandLineArgs, SubCommands, parse_param};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

fn init_logger(dev: bool) {
  const DEFAULT: &str = "info,tracing::span=warn";

  env_logger::Builder::from_env(if dev {
    env_logger::Env::new().default_filter_or(format!("{DEFAULT},tablerest=debug"))
  } else {
    env_logger::Env::new().default_filter_or(DEFAULT)
  })
  .format_timestamp_micros()
  .init();
}

async fn async_main() -> Result<(), BoxError> {
  let args = DefaultCommandLineArgs::parse();
  let database_config = args.database_config();

  match args.cmd {
    Some(SubCommands::Run(cmd)) => {
      init_logger(cmd.dev);

      let app = Server::init(ServerOptions {
        address: cmd.address,
        table: cmd.table,
        database: database_config,
        dev: cmd.dev,
        log_responses: cmd.dev || cmd.stderr_logging,
        cors_allowed_origins: cmd.cors_allowed_origins,
      })
      .await?;

      app.serve().await?;
    }
    Some(SubCommands::Query { sql, param }) => {
      init_logger(false);

      let database = Database::connect(&database_config)?;
      let params: Vec<Value> = param.into_iter().map(parse_param).collect();

      match database.run(&sql, params).await {
        Ok(rows) => {
          println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        Err(err) => {
          println!("{}", serde_json::to_string_pretty(&err.payload())?);
          return Err(err.into());
        }
      }

      database.close().await?;
    }
    None => {
      let _ = DefaultCommandLineArgs::command().print_help();
    }
  }

  return Ok(());
}

fn main() -> Result<(), BoxError> {
  let runtime = Rc::new(
    tokio::runtime::Builder::new_multi_thread()
      .enable_all()
      .build()?,
  );
  return runtime.block_on(async_main());
}
