//! Application configuration
//!
//! Runtime settings come from command-line flags or `QUIZNOTE_*`
//! environment variables. Fixed limits and defaults live here as
//! constants so handlers and services share one source of truth.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

// ===== Quiz Generation =====

/// Number of questions requested from the completion API per quiz
pub const QUESTIONS_PER_QUIZ: usize = 5;

/// Time limit stored on every generated quiz, in seconds (10 minutes)
pub const DEFAULT_TIME_LIMIT_SECS: i64 = 600;

/// Type tag stored on generated questions
pub const QUESTION_TYPE_MCQ: &str = "MCQ";

/// Default chat model used for question synthesis
pub const DEFAULT_COMPLETION_MODEL: &str = "gpt-4o";

/// Default OpenAI-compatible API root
pub const DEFAULT_COMPLETION_BASE_URL: &str = "https://api.openai.com/v1";

// ===== Quiz Taking =====

/// Countdown shown while a quiz is being taken.
/// Display only; submissions after it expires are still scored.
pub const QUIZ_COUNTDOWN: Duration = Duration::from_secs(600);

// ===== Uploads =====

/// Maximum accepted request body for document uploads (25 MiB)
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Maximum stored filename length in characters
pub const MAX_FILENAME_LENGTH: usize = 255;

// ===== Sessions =====

/// Lifetime of a bearer session token
pub const SESSION_TTL_DAYS: i64 = 7;

/// Random bytes in a session token before hex encoding
pub const SESSION_TOKEN_BYTES: usize = 32;

/// Minimum password length accepted at sign-up
pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Clone, Debug, Parser)]
#[command(name = "quiznote", version, about)]
pub struct Settings {
    /// Address to bind the HTTP listener to
    #[arg(long, env = "QUIZNOTE_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to bind the HTTP listener to
    #[arg(long, env = "QUIZNOTE_PORT", default_value_t = 3000)]
    pub port: u16,

    /// Directory holding the SQLite database and uploaded documents
    #[arg(long, env = "QUIZNOTE_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// API key for the completion service
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: String,

    /// Base URL of the OpenAI-compatible completion service
    #[arg(long, env = "QUIZNOTE_OPENAI_BASE_URL", default_value = DEFAULT_COMPLETION_BASE_URL)]
    pub openai_base_url: String,

    /// Chat model used to generate questions
    #[arg(long, env = "QUIZNOTE_OPENAI_MODEL", default_value = DEFAULT_COMPLETION_MODEL)]
    pub openai_model: String,

    /// Timeout for a single completion request, in seconds
    #[arg(long, env = "QUIZNOTE_COMPLETION_TIMEOUT_SECS", default_value_t = 120)]
    pub completion_timeout_secs: u64,
}

impl Settings {
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("quiznote.sqlite")
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.data_dir.join("uploads")
    }

    pub fn completion_timeout(&self) -> Duration {
        Duration::from_secs(self.completion_timeout_secs)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
