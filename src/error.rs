use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Terminal, per-request failures of the book and auth APIs.
///
/// Every variant maps to exactly one status code and renders as
/// `{"error": <message>}`. Nothing here is retried.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{message}")]
    Internal {
        message: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ApiError {
    pub fn internal(message: &'static str) -> impl FnOnce(anyhow::Error) -> ApiError {
        move |source| ApiError::Internal {
            message,
            source: source.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        use ApiError::*;
        match self {
            Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Forbidden(_) => StatusCode::FORBIDDEN,
            NotFound(_) => StatusCode::NOT_FOUND,
            Validation(_) => StatusCode::BAD_REQUEST,
            Conflict(_) => StatusCode::CONFLICT,
            Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Logs the cause chain of an internal error. Anything that turns an
    /// `ApiError` into a response without `into_response` must call this.
    pub fn log_if_internal(&self) {
        if let ApiError::Internal { message, source } = self {
            tracing::error!(error = %crate::unpack_error(source.as_ref()), "{}", message);
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log_if_internal();

        let body = ErrorResponse {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn logged_while(f: impl FnOnce()) -> String {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = logs.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn internal_errors_log_their_cause() {
        let err = ApiError::internal("Failed to create book")(anyhow::anyhow!("no such table: books"));
        let logs = logged_while(|| err.log_if_internal());
        assert!(logs.contains("ERROR"));
        assert!(logs.contains("Failed to create book"));
        assert!(logs.contains("no such table: books"));
    }

    #[test]
    fn client_errors_are_not_logged() {
        let err = ApiError::Validation("Missing required fields: title".into());
        assert_eq!(logged_while(|| err.log_if_internal()), "");
    }

    #[test]
    fn internal_details_stay_out_of_the_message() {
        let err = ApiError::internal("Failed to delete book")(anyhow::anyhow!("disk I/O error"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Failed to delete book");
        assert!(crate::unpack_error(&err).contains("disk I/O error"));
    }

    #[test]
    fn status_codes() {
        assert_eq!(ApiError::Unauthorized("Unauthorized").status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Forbidden("nope").status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::NotFound("Book not found").status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Validation("title is required".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Conflict("taken".into()).status(), StatusCode::CONFLICT);
    }
}
