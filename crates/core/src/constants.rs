pub const ENV_DATABASE_DSN: &str = "DATABASE_DSN";
pub const ENV_DATABASE_USER: &str = "DATABASE_USER";
pub const ENV_DATABASE_PASS: &str = "DATABASE_PASS";

pub const SQLITE_MEMORY: &str = "sqlite::memory:";

// Records are always looked up by this column.
pub const RECORD_ID_COLUMN: &str = "id";
// Parameter name for the record id in UPDATE statements. Kept distinct from `:id` so that a
// request body may itself update the "id" column.
pub(crate) const RECORD_ID_PARAM: &str = ":__record_id";

// Public APIs
pub const REST_API_PATH: &str = "api/v1";
pub const HEALTHCHECK_PATH: &str = "api/healthcheck";

pub const DEFAULT_ADDRESS: &str = "localhost:4000";
pub(crate) const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;
