use thiserror::Error;

/// Fatal misconfiguration detected while building a session. None of these are
/// recoverable at runtime; the host surfaces them and exits.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("word corpus `{0}` has no words")]
    EmptyCorpus(String),

    #[error("corpus file `{0}.json` is missing or not valid JSON")]
    BadCorpusFile(String),

    #[error("test duration must be positive (got {0} seconds)")]
    NonPositiveDuration(f64),
}
