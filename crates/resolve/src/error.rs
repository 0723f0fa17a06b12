use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),

    /// Config validation error (no sources, bad merge member, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),

    /// A source targets a catalog that is not declared.
    #[error("unknown catalog: {0}")]
    UnknownCatalog(String),

    /// A merge group or lookup names a source that is not declared.
    #[error("unknown source: {0}")]
    UnknownSource(String),

    /// A sanitizer rule or grammar pattern failed to compile.
    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// A grammar pattern compiled but lacks a required capture group.
    #[error("grammar pattern is missing capture group '{group}'")]
    MissingGroup { group: &'static str },

    /// Missing required column in input data.
    #[error("'{file}': missing column '{column}'")]
    MissingColumn { file: String, column: String },

    /// CSV reader error.
    #[error("'{file}': {reason}")]
    Csv { file: String, reason: String },

    /// IO error (file read, etc.).
    #[error("IO error: {0}")]
    Io(String),
}
