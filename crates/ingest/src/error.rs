use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading snapshot or informe files. Carries enough
/// file/line context to point at the offending row.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("invalid {field} value `{value}` at {path} row {row}")]
    InvalidField { field: &'static str, value: String, path: PathBuf, row: usize },

    #[error("{path} row {row} has {found} columns, expected at least {expected}")]
    ShortRow { path: PathBuf, row: usize, found: usize, expected: usize },
}

pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::IngestError;

    #[test]
    fn invalid_field_names_the_location() {
        let error = IngestError::InvalidField {
            field: "quantity_sold",
            value: "abc".to_string(),
            path: PathBuf::from("sales.csv"),
            row: 3,
        };
        assert_eq!(
            error.to_string(),
            "invalid quantity_sold value `abc` at sales.csv row 3"
        );
    }
}
