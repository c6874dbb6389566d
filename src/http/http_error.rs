use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use core::fmt;
use std::error::Error;

/// An error response carrying only a status code and its canonical reason as the body
#[derive(Debug)]
pub struct HttpError(StatusCode);

impl HttpError {
    pub fn new(status_code: StatusCode) -> Self {
        Self(status_code)
    }

    fn reason(&self) -> &'static str {
        self.0.canonical_reason().unwrap_or("unknown")
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.0.as_str(), self.reason())
    }
}

impl Error for HttpError {}

impl ResponseError for HttpError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.0).body(self.reason())
    }

    fn status_code(&self) -> StatusCode {
        self.0
    }
}
