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

//! First-match converter resolution.

use std::fmt;
use std::sync::Arc;

/// A capability check against some input.
///
/// Converters implement this for whatever they are selected by: an event, a
/// content type or an error descriptor.
pub trait Supports<I: ?Sized> {
    /// Returns `true` if this converter can handle `input`.
    fn supports(&self, input: &I) -> bool;
}

/// An ordered list of converters resolved first-match-wins.
///
/// Resolution walks the list in registration order and returns the first
/// converter whose [`Supports::supports`] is true. Converters added later
/// never shadow earlier ones, so resolution for a given input is stable.
///
/// # Examples
///
/// ```rust
/// use crirpc::converter::{ConverterChain, Supports};
/// use std::sync::Arc;
///
/// struct Prefix(&'static str);
///
/// impl Supports<str> for Prefix {
///     fn supports(&self, input: &str) -> bool {
///         input.starts_with(self.0)
///     }
/// }
///
/// let chain = ConverterChain::new()
///     .with(Arc::new(Prefix("text/")))
///     .with(Arc::new(Prefix("text/plain")));
///
/// assert_eq!(chain.resolve("text/plain").unwrap().0, "text/");
/// assert!(chain.resolve("application/json").is_none());
/// ```
pub struct ConverterChain<C: ?Sized> {
    converters: Vec<Arc<C>>,
}

impl<C: ?Sized> ConverterChain<C> {
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self {
            converters: Vec::new(),
        }
    }

    /// Appends a converter.
    #[must_use]
    pub fn with(mut self, converter: Arc<C>) -> Self {
        self.push(converter);
        self
    }

    /// Appends a converter.
    pub fn push(&mut self, converter: Arc<C>) {
        self.converters.push(converter);
    }

    /// Number of registered converters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.converters.len()
    }

    /// Returns `true` if no converter is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }

    /// Iterates converters in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<C>> {
        self.converters.iter()
    }

    /// Returns the first converter that supports `input`.
    ///
    /// `None` means nothing matched, which callers report differently from a
    /// converter that matched and then failed.
    pub fn resolve<I: ?Sized>(&self, input: &I) -> Option<&Arc<C>>
    where
        C: Supports<I>,
    {
        self.converters.iter().find(|c| c.supports(input))
    }
}

impl<C: ?Sized> Default for ConverterChain<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ?Sized> Clone for ConverterChain<C> {
    fn clone(&self) -> Self {
        Self {
            converters: self.converters.clone(),
        }
    }
}

impl<C: ?Sized> fmt::Debug for ConverterChain<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterChain")
            .field("len", &self.converters.len())
            .finish()
    }
}
