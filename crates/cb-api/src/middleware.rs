//! Middleware for logging, CORS and response security headers.

use actix_cors::Cors;
use actix_web::middleware::{DefaultHeaders, Logger};

const CONTENT_SECURITY_POLICY: &str =
    "default-src 'self'; img-src 'self'; style-src 'self' 'unsafe-inline'; form-action 'self'";

/// Access log in the default format:
/// remote-ip "request-line" status-code response-size "referrer" "user-agent"
pub fn standard_middleware() -> Logger {
    Logger::default()
}

// Same-origin forms only need GET and POST.
pub fn cors_policy() -> Cors {
    Cors::default()
        .allowed_methods(vec!["GET", "POST"])
        .max_age(3600)
}

pub fn security_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("X-Content-Type-Options", "nosniff"))
        .add(("Referrer-Policy", "strict-origin-when-cross-origin"))
        .add(("Content-Security-Policy", CONTENT_SECURITY_POLICY))
}
