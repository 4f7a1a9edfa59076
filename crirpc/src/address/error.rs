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

//! Address parsing errors.

use thiserror::Error;

/// Errors produced while parsing or building an [`Address`](super::Address).
///
/// Every variant carries the offending raw text so the failure can be
/// reported without the caller keeping its own copy.
///
/// # Examples
///
/// ```rust
/// use crirpc::address::{Address, AddressError};
///
/// let error = Address::parse("a.b.Service").unwrap_err();
/// assert!(matches!(error, AddressError::MissingScheme { .. }));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// The raw string has no `scheme://` prefix, or the scheme is empty.
    #[error("address '{raw}' has no scheme")]
    MissingScheme {
        /// The raw text that failed to parse.
        raw: String,
    },

    /// The resource name is empty.
    #[error("address '{raw}' has no resource name")]
    MissingResourceName {
        /// The raw text that failed to parse.
        raw: String,
    },

    /// A component is present but violates the grammar.
    #[error("address '{raw}' is malformed: {reason}")]
    Malformed {
        /// The raw text that failed to parse.
        raw: String,
        /// Which rule was broken.
        reason: &'static str,
    },
}

impl AddressError {
    /// Returns the raw text that failed to parse.
    #[must_use]
    pub fn raw(&self) -> &str {
        match self {
            Self::MissingScheme { raw }
            | Self::MissingResourceName { raw }
            | Self::Malformed { raw, .. } => raw,
        }
    }

    pub(crate) fn malformed(raw: &str, reason: &'static str) -> Self {
        Self::Malformed {
            raw: raw.to_string(),
            reason,
        }
    }
}
