//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Observability support for crirpc.
//!
//! - **[`RpcMetrics`]**: call counters shared by supervisors and clients
//! - **[`log_error`]**: structured logging of [`RpcError`]s by category
//!
//! All logging goes through `tracing`. Install any subscriber to see it:
//!
//! ```rust,ignore
//! use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
//!
//! tracing_subscriber::registry()
//!     .with(tracing_subscriber::fmt::layer())
//!     .with(tracing_subscriber::EnvFilter::from_default_env())
//!     .init();
//! ```

mod metrics;

pub use metrics::RpcMetrics;

use crate::error::RpcError;

/// Logs an error with structured fields at a level chosen by its category.
///
/// Transport failures log at WARN, application failures and cancellations
/// at DEBUG, and framework failures (dispatch and conversion) at ERROR.
///
/// # Examples
///
/// ```rust
/// use crirpc::observability::log_error;
/// use crirpc::RpcError;
///
/// log_error(&RpcError::missing_method("a.b.Foo", "baz"));
/// ```
pub fn log_error(error: &RpcError) {
    if error.is_transport_error() {
        tracing::warn!(
            error = %error,
            class = error.class_name(),
            recoverable = error.is_recoverable(),
            "transport error"
        );
    } else if error.is_application_error() || error.is_canceled() {
        tracing::debug!(error = %error, class = error.class_name(), "call failed");
    } else {
        tracing::error!(error = %error, class = error.class_name(), "dispatch error");
    }
}
