use thiserror::Error;

/// Errors originating from the core module.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Input data that cannot be sonified as given.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid configuration value or structure.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Scale name absent from the built-in table.
    #[error("Unknown scale: {name}")]
    UnknownScale {
        /// The name that was looked up.
        name: String,
    },

    /// Series identifier absent from the dataset.
    #[error("Unknown series: {id}")]
    UnknownSeries {
        /// The gauge identifier that was requested.
        id: String,
    },
}
