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

//! Correlation ids for matching responses to calls.

use std::sync::atomic::{AtomicU64, Ordering};

/// Generates the correlation ids of one client.
///
/// An id is the decimal form of a per-client counter starting at 1. It is
/// used both as the `correlation-id` header and as the path of the call's
/// reply address, so it is unique within the client's reply scope.
///
/// # Example
///
/// ```rust
/// use crirpc::rpc::CorrelationIdGenerator;
///
/// let generator = CorrelationIdGenerator::new();
/// assert_eq!(generator.next(), "1");
/// assert_eq!(generator.next(), "2");
/// assert_eq!(generator.issued(), 2);
/// ```
#[derive(Debug)]
pub struct CorrelationIdGenerator {
    next_id: AtomicU64,
}

impl CorrelationIdGenerator {
    /// Creates a generator whose first id is `"1"`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
        }
    }

    /// Returns a fresh id.
    #[must_use]
    pub fn next(&self) -> String {
        self.next_id.fetch_add(1, Ordering::Relaxed).to_string()
    }

    /// Number of ids handed out so far.
    #[must_use]
    pub fn issued(&self) -> u64 {
        self.next_id.load(Ordering::Relaxed) - 1
    }
}

impl Default for CorrelationIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
