//! Live/degraded backend selection shared by every facade.
//!
//! A facade decides once, at construction, whether it talks to a real backend
//! or serves calls locally. The decision is captured in a [`Binding`] and never
//! revisited: there is no reconnection or retry loop.
//!
//! ```rust,ignore
//! let attempt = if config.enabled {
//!     Some(connect(&config).await)
//! } else {
//!     None
//! };
//! let binding = Binding::select(LABELS, attempt, || Arc::new(InMemoryCache::new()));
//! ```

use crate::error::SetupError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Whether a facade forwards calls to its backend or serves them locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FacadeMode {
    /// Calls are forwarded to the configured external backend.
    Live,
    /// Calls are served in-process, simulated, or dropped.
    Degraded,
}

impl FacadeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Degraded => "degraded",
        }
    }
}

impl fmt::Display for FacadeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a facade ended up degraded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DegradedReason {
    /// The enable flag was off.
    Disabled,
    /// The backend was enabled but could not be bound.
    Fallback(String),
}

/// Human-readable names used in the construction notice.
#[derive(Debug, Clone, Copy)]
pub struct FacadeLabels {
    /// Name of the live backend, e.g. "Redis cache".
    pub service: &'static str,
    /// Name of the local replacement, e.g. "in-memory cache".
    pub degraded: &'static str,
}

/// A successfully acquired live backend.
pub struct Connected<B: ?Sized> {
    backend: Arc<B>,
    detail: Option<String>,
}

impl<B: ?Sized> Connected<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            detail: None,
        }
    }

    /// Extra text appended to the "enabled" notice, e.g. "TEST mode".
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Outcome of trying to bind a live backend. `None` means the flag was off.
pub type Attempt<B> = Option<Result<Connected<B>, SetupError>>;

/// The backend a facade serves calls with, and the mode it was bound in.
pub struct Binding<B: ?Sized> {
    backend: Arc<B>,
    mode: FacadeMode,
    reason: Option<DegradedReason>,
}

impl<B: ?Sized> Binding<B> {
    /// Resolve a construction attempt into a binding.
    ///
    /// Emits exactly one status line through `tracing`. Never fails: any
    /// setup error becomes a degraded binding built by `fallback`.
    pub fn select(labels: FacadeLabels, attempt: Attempt<B>, fallback: impl FnOnce() -> Arc<B>) -> Self {
        match attempt {
            None => {
                tracing::info!(
                    target: "failsoft::facade",
                    service = labels.service,
                    mode = "degraded",
                    "{} disabled, using {}",
                    labels.service,
                    labels.degraded
                );
                Self::degraded(fallback(), DegradedReason::Disabled)
            }
            Some(Ok(connected)) => {
                match connected.detail {
                    Some(ref detail) => tracing::info!(
                        target: "failsoft::facade",
                        service = labels.service,
                        mode = "live",
                        "{} enabled ({})",
                        labels.service,
                        detail
                    ),
                    None => tracing::info!(
                        target: "failsoft::facade",
                        service = labels.service,
                        mode = "live",
                        "{} enabled",
                        labels.service
                    ),
                }
                Self::live(connected.backend)
            }
            Some(Err(err)) => {
                tracing::warn!(
                    target: "failsoft::facade",
                    service = labels.service,
                    mode = "degraded",
                    error = %err,
                    "{} unavailable, falling back to {}",
                    labels.service,
                    labels.degraded
                );
                Self::degraded(fallback(), DegradedReason::Fallback(err.to_string()))
            }
        }
    }

    /// Bind a live backend directly, skipping the construction notice.
    pub fn live(backend: Arc<B>) -> Self {
        Self {
            backend,
            mode: FacadeMode::Live,
            reason: None,
        }
    }

    /// Bind a degraded backend directly, skipping the construction notice.
    pub fn degraded(backend: Arc<B>, reason: DegradedReason) -> Self {
        Self {
            backend,
            mode: FacadeMode::Degraded,
            reason: Some(reason),
        }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn mode(&self) -> FacadeMode {
        self.mode
    }

    pub fn is_live(&self) -> bool {
        self.mode == FacadeMode::Live
    }

    /// `None` when live.
    pub fn degraded_reason(&self) -> Option<&DegradedReason> {
        self.reason.as_ref()
    }
}

impl<B: ?Sized> Clone for Binding<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            mode: self.mode,
            reason: self.reason.clone(),
        }
    }
}

impl<B: ?Sized> fmt::Debug for Binding<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("mode", &self.mode)
            .field("reason", &self.reason)
            .finish_non_exhaustive()
    }
}
