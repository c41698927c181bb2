//! Helpers that log common events with a consistent shape.

use super::{Extra, Logger};
use crate::Fields;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Log a handled HTTP request at `info`.
///
/// ```rust,ignore
/// log_request(&logger, "GET", "/api/users/123", 200, 45.2);
/// ```
pub fn log_request(logger: &Logger, method: &str, path: &str, status: u16, duration_ms: f64) {
    tracing::info!(
        target: "failsoft::logging",
        logger = logger.name(),
        method,
        path,
        status_code = status,
        duration_ms = round2(duration_ms),
        "HTTP request"
    );
}

/// Log a database query at `debug`. `rows` is omitted when unknown.
pub fn log_db_query(logger: &Logger, query: &str, duration_ms: f64, rows: Option<u64>) {
    tracing::debug!(
        target: "failsoft::logging",
        logger = logger.name(),
        query,
        duration_ms = round2(duration_ms),
        rows,
        "Database query"
    );
}

/// Log an error at `error` with its type, message, cause chain and a backtrace.
///
/// The backtrace is captured here, not where the error was created, and only
/// when `RUST_BACKTRACE`/`RUST_LIB_BACKTRACE` enable it.
pub fn log_error<E>(logger: &Logger, error: &E, context: &Fields)
where
    E: Error + ?Sized,
{
    let chain = source_chain(error);
    let backtrace = Backtrace::capture();
    let backtrace = (backtrace.status() == BacktraceStatus::Captured).then_some(backtrace);

    tracing::error!(
        target: "failsoft::logging",
        logger = logger.name(),
        error_type = short_type_name::<E>(),
        error_message = %error,
        caused_by = (!chain.is_empty()).then(|| tracing::field::display(chain.join(": "))),
        context = (!context.is_empty()).then(|| tracing::field::display(Extra(context))),
        backtrace = backtrace.as_ref().map(tracing::field::display),
        "Exception occurred"
    );
}

/// Messages of every error in the `source()` chain, outermost first.
pub(crate) fn source_chain<E: Error + ?Sized>(error: &E) -> Vec<String> {
    let mut chain = Vec::new();
    let mut source = error.source();
    while let Some(cause) = source {
        chain.push(cause.to_string());
        source = cause.source();
    }
    chain
}

/// Type name of an error behind `dyn Error`, read from its `Debug` output.
///
/// Same heuristic Sentry applies to exception types: the leading identifier
/// of `{:?}`, e.g. `ParseIntError` for `ParseIntError { kind: InvalidDigit }`.
pub(crate) fn error_type_name(error: &dyn Error) -> String {
    let debug = format!("{:?}", error);
    let head = debug
        .split([' ', '(', '{', '\r', '\n'])
        .next()
        .unwrap_or_default()
        .trim();
    match head.rfind("::") {
        Some(pos) => head[pos + 2..].to_string(),
        None if head.is_empty() => "Error".to_string(),
        None => head.to_string(),
    }
}

/// Type name without its module path, e.g. `ParseIntError`.
pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    // Keep generic arguments intact: only strip the path before the first `<`
    let head_end = full.find('<').unwrap_or(full.len());
    match full[..head_end].rfind("::") {
        Some(pos) => &full[pos + 2..],
        None => full,
    }
}
