mod init;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tokio::signal;
use tower_http::{cors, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{filter, prelude::*};

use crate::config::DatabaseConfig;
use crate::constants::{BODY_LIMIT_BYTES, DEFAULT_ADDRESS, HEALTHCHECK_PATH, REST_API_PATH};
use crate::database::Database;
use crate::logging;
use crate::rest_api::{self, RestApi};

pub use init::{InitError, init_rest_api};

/// A set of options to configure serving behaviors. Changing any of these options
/// requires a server restart, which makes them a natural fit for being exposed as command line
/// arguments.
#[derive(Debug, Clone)]
pub struct ServerOptions {
  // Address the HTTP server binds to (Default: localhost:4000).
  pub address: String,

  /// The table exposed at `/api/v1/<table>`.
  pub table: String,

  pub database: DatabaseConfig,

  /// Dev mode, i.e. permissive CORS.
  pub dev: bool,

  /// Print request/response logs to stderr.
  pub log_responses: bool,

  /// Limit the set of allowed origins the HTTP server will answer to.
  pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerOptions {
  fn default() -> Self {
    return Self {
      address: DEFAULT_ADDRESS.to_string(),
      table: String::new(),
      database: DatabaseConfig::from_env(),
      dev: false,
      log_responses: false,
      cors_allowed_origins: vec![],
    };
  }
}

pub struct Server {
  api: RestApi,
  log_responses: bool,

  router: (String, Router),
}

impl Server {
  /// Connects to the database and sets up the routes.
  pub async fn init(opts: ServerOptions) -> Result<Self, InitError> {
    let api = init::init_rest_api(&opts.table, &opts.database).await?;
    let router = Self::build_main_router(&api, &opts);

    return Ok(Self {
      api,
      log_responses: opts.log_responses,
      router,
    });
  }

  pub fn rest_api(&self) -> &RestApi {
    return &self.api;
  }

  pub fn database(&self) -> &Database {
    return self.api.database();
  }

  pub fn router(&self) -> &Router<()> {
    return &self.router.1;
  }

  pub async fn serve(&self) -> std::io::Result<()> {
    // This declares **where** tracing is being logged to.
    //
    // NOTE: it's ok to fail. Just means someone else already initialize the tracing sub-system.
    if self.log_responses {
      let _ = tracing_subscriber::registry()
        .with(
          tracing_subscriber::fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_filter(
              filter::Targets::new()
                .with_target(logging::EVENT_TARGET, logging::LEVEL)
                .with_default(filter::LevelFilter::OFF),
            ),
        )
        .try_init();
    }

    let (addr, router) = self.router.clone();
    log::info!(
      "listening on http://{addr}/{REST_API_PATH}/{table} 🚀",
      table = self.api.table_name()
    );

    return Self::start_listener(&addr, router).await;
  }

  async fn start_listener(addr: &str, router: Router<()>) -> std::io::Result<()> {
    let listener = match tokio::net::TcpListener::bind(addr).await {
      Ok(listener) => listener,
      Err(err) => {
        log::error!("Failed to listen on: {addr}: {err}");
        return Err(err);
      }
    };

    if let Err(err) = axum::serve(listener, router)
      .with_graceful_shutdown(shutdown_signal())
      .await
    {
      log::error!("Failed to start server: {err}");
      return Err(err);
    }

    return Ok(());
  }

  fn build_main_router(api: &RestApi, opts: &ServerOptions) -> (String, Router) {
    let router = Router::new()
      .route(&format!("/{HEALTHCHECK_PATH}"), get(healthcheck_handler))
      .nest(
        &format!("/{REST_API_PATH}/{table}", table = api.table_name()),
        rest_api::router(api.clone()),
      );

    return (
      opts.address.clone(),
      Self::wrap_with_default_layers(opts, router),
    );
  }

  fn wrap_with_default_layers(opts: &ServerOptions, router: Router) -> Router<()> {
    return router
      .layer(build_cors(opts))
      .layer(
        // This declares: **what information** is logged at what level in to events and spans.
        TraceLayer::new_for_http()
          .make_span_with(logging::http_logger_make_span)
          .on_request(logging::http_logger_on_request)
          .on_response(logging::http_logger_on_response),
      )
      // Default is only 2MB Increase to 10MB.
      .layer(DefaultBodyLimit::disable())
      .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES));
  }
}

async fn healthcheck_handler() -> Response {
  return (StatusCode::OK, "Ok").into_response();
}

fn build_cors(opts: &ServerOptions) -> cors::CorsLayer {
  if opts.dev {
    return cors::CorsLayer::very_permissive();
  }

  let origin_strs = &opts.cors_allowed_origins;
  let wildcard = origin_strs.iter().any(|s| s == "*");

  let origins = if wildcard {
    log::info!("CORS: allow any origin");
    cors::AllowOrigin::mirror_request()
  } else {
    cors::AllowOrigin::list(origin_strs.iter().filter_map(|o| {
      match HeaderValue::from_str(o.as_str()) {
        Ok(value) => Some(value),
        Err(err) => {
          log::error!("Invalid CORS origin {o}: {err}");
          None
        }
      }
    }))
  };

  // Cannot combine `Access-Control-Allow-Credentials: true` with `Access-Control-Allow-Methods: *`
  return cors::CorsLayer::new()
    .allow_methods(cors::Any)
    .allow_origin(origins);
}

async fn shutdown_signal() {
  let ctrl_c = async {
    if let Err(err) = signal::ctrl_c().await {
      log::error!("Failed to install Ctrl+C handler: {err}");
      std::future::pending::<()>().await;
    }
  };

  #[cfg(unix)]
  let terminate = async {
    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
      Ok(mut sig) => {
        sig.recv().await;
      }
      Err(err) => {
        log::error!("Failed to install signal handler: {err}");
        std::future::pending::<()>().await;
      }
    };
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
      _ = ctrl_c => {
      log::info!("Received Ctrl+C. Shutting down gracefully.");
    },
      _ = terminate => {
      log::info!("Received termination. Shutting down gracefully.");
    },
  }
}
