use thiserror::Error;

/// Errors surfaced by the query layer.
///
/// All of these are fail-fast: a malformed filter or an unknown field is a
/// programming error at the boundary, not a transient condition, so the core
/// never retries and never substitutes defaults.
#[derive(Debug, Error)]
pub enum Error {
    /// A filter key or requested output field has no entry in the schema.
    #[error("unknown field: '{0}'")]
    UnknownField(String),

    /// A bounded filter carried a kind outside RANGE / DATE.
    #[error("unsupported filter kind: '{0}' (expected RANGE or DATE)")]
    UnsupportedFilterKind(String),

    /// `distinct_prefixes` was asked for a field with no prefix derivation.
    #[error("field '{0}' has no derived prefix; use a location-code field")]
    InvalidField(String),

    /// The connection-backed dataset source is declared but not implemented.
    #[error("connection-backed datasets are not implemented yet")]
    BackendNotImplemented,

    /// A source kind other than file or connection.
    #[error("unsupported source kind: '{0}'")]
    UnsupportedSource(String),

    /// Schema construction saw the same frontend or backend name twice.
    #[error("duplicate {namespace} name in schema: '{name}'")]
    DuplicateField {
        namespace: &'static str,
        name: String,
    },

    /// A range filter bound cannot be compared with the column's values.
    #[error("range filter on '{field}' compares incompatible types")]
    TypeMismatch { field: String },

    /// A DATE filter bound failed to parse as an ISO-8601 date.
    #[error("invalid date bound: '{0}' (expected YYYY-MM-DD)")]
    InvalidDate(String),

    /// Reading or parsing a dataset file failed.
    #[error("failed to load dataset")]
    Load(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
