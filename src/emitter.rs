//! Publishing computed policies to the response layer.
//!
//! A finished [`CachePolicy`] is converted into at most two artifacts: a
//! cache-control descriptor (visibility plus up to two freshness windows)
//! and a comma-joined vary attribute list. Both are in-process handoffs,
//! keyed for retrieval by the response-emission layer; absence of artifacts
//! means no caching constraints were declared and the caller applies its
//! own default.

use crate::error::Result;
use crate::hint::CacheScope;
use crate::policy::CachePolicy;
use axum::http::{header, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Extension key under which the cache-control descriptor is stored.
pub const CACHE_CONTROL_EXTENSION: &str = "cacheControl";

/// Extension key under which the vary attribute list is stored.
pub const VARY_EXTENSION: &str = "vary";

/// Cache-control descriptor published for one response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheControlDescriptor {
    /// Whether only private caches may store the response.
    pub private: bool,

    /// Freshness window in seconds for private/default caches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_age: Option<u32>,

    /// Freshness window in seconds for shared caches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_max_age: Option<u32>,
}

impl CacheControlDescriptor {
    /// The private-cache freshness window as a `Duration`.
    pub fn max_age_duration(&self) -> Option<Duration> {
        self.max_age.map(|seconds| Duration::from_secs(seconds.into()))
    }

    /// The shared-cache freshness window as a `Duration`.
    pub fn shared_max_age_duration(&self) -> Option<Duration> {
        self.shared_max_age
            .map(|seconds| Duration::from_secs(seconds.into()))
    }

    /// Render the descriptor as a `Cache-Control` header value, e.g.
    /// `private, max-age=30` or `max-age=60, s-maxage=300`. Public
    /// visibility is the absence of the `private` token.
    pub fn header_value(&self) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(3);
        if self.private {
            parts.push("private".to_string());
        }
        if let Some(seconds) = self.max_age {
            parts.push(format!("max-age={seconds}"));
        }
        if let Some(seconds) = self.shared_max_age {
            parts.push(format!("s-maxage={seconds}"));
        }
        parts.join(", ")
    }
}

/// The zero, one, or two artifacts published for one computation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyArtifacts {
    /// Present when at least one freshness window was declared.
    pub cache_control: Option<CacheControlDescriptor>,

    /// Comma-joined, sorted, lower-cased vary attribute list; present when
    /// any vary attribute was declared.
    pub vary: Option<String>,
}

impl PolicyArtifacts {
    /// Whether nothing was published.
    pub fn is_empty(&self) -> bool {
        self.cache_control.is_none() && self.vary.is_none()
    }

    /// Store the artifacts keyed into an execution-context extension map
    /// for retrieval by the response-emission layer.
    pub fn store(&self, extensions: &mut HashMap<String, serde_json::Value>) -> Result<()> {
        if let Some(descriptor) = &self.cache_control {
            extensions.insert(
                CACHE_CONTROL_EXTENSION.to_string(),
                serde_json::to_value(descriptor)?,
            );
        }
        if let Some(vary) = &self.vary {
            extensions.insert(
                VARY_EXTENSION.to_string(),
                serde_json::Value::String(vary.clone()),
            );
        }
        Ok(())
    }

    /// Write the artifacts as HTTP response headers.
    ///
    /// Convenience for hosts without their own response layer. Header values
    /// are built from validated metadata, so conversion cannot fail for
    /// policies produced by the folder.
    pub fn apply_headers(&self, headers: &mut HeaderMap) {
        if let Some(descriptor) = &self.cache_control {
            if let Ok(value) = HeaderValue::from_str(&descriptor.header_value()) {
                headers.insert(header::CACHE_CONTROL, value);
            }
        }
        if let Some(vary) = &self.vary {
            if let Ok(value) = HeaderValue::from_str(vary) {
                headers.insert(header::VARY, value);
            }
        }
    }
}

/// Convert a finished policy into its published artifacts.
///
/// A descriptor is published only when at least one freshness window is
/// set; a vary list only when non-empty. A fully unconstrained policy
/// publishes nothing.
pub fn emit(policy: &CachePolicy) -> PolicyArtifacts {
    let cache_control = if policy.max_age.is_some() || policy.shared_max_age.is_some() {
        Some(CacheControlDescriptor {
            private: policy.scope == CacheScope::Private,
            max_age: policy.max_age,
            shared_max_age: policy.shared_max_age,
        })
    } else {
        None
    };

    let vary = if policy.vary.is_empty() {
        None
    } else {
        Some(
            policy
                .vary
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", "),
        )
    };

    if cache_control.is_some() || vary.is_some() {
        tracing::debug!(
            cache_control = ?cache_control,
            vary = ?vary,
            "Published cache policy artifacts"
        );
    }

    PolicyArtifacts { cache_control, vary }
}
