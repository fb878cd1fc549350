use thiserror::Error;

/// Crate-wide error type. Mirrors the flat, named-variant shape used
/// elsewhere in this codebase, minus any HTTP-response rendering -
/// there is no server surface here to render onto.
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("http error ({status}): {message}")]
    Http { status: u16, message: String },

    #[error("rate limit retries exhausted after {attempts} attempts")]
    RateLimitExhausted { attempts: u32 },

    #[error("request timed out")]
    Timeout,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("unexpected data shape: {0}")]
    DataShape(String),
}

impl ArchiveError {
    /// True for the access-denied statuses that callers soft-skip rather
    /// than propagate, per the error-handling design (401/403).
    pub fn is_forbidden(&self) -> bool {
        matches!(self, ArchiveError::Http { status, .. } if *status == 401 || *status == 403)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ArchiveError::Http { status, .. } if *status == 404)
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ArchiveError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type ArchiveResult<T> = Result<T, ArchiveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forbidden_statuses_are_soft_skippable() {
        let forbidden = ArchiveError::Http {
            status: 403,
            message: "missing access".into(),
        };
        assert!(forbidden.is_forbidden());
        assert!(!forbidden.is_not_found());

        let unauthorized = ArchiveError::Http {
            status: 401,
            message: "bad token".into(),
        };
        assert!(unauthorized.is_forbidden());
    }

    #[test]
    fn not_found_is_not_forbidden() {
        let not_found = ArchiveError::Http {
            status: 404,
            message: "no such channel".into(),
        };
        assert!(not_found.is_not_found());
        assert!(!not_found.is_forbidden());
    }

    #[test]
    fn server_error_is_neither() {
        let server_error = ArchiveError::Http {
            status: 500,
            message: "internal".into(),
        };
        assert!(!server_error.is_forbidden());
        assert!(!server_error.is_not_found());
    }
}
