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

//! Pluggable payload conversion.
//!
//! Conversion is split into five roles, each resolved through its own
//! [`ConverterChain`]:
//!
//! | Side   | Role                         | Selected by            |
//! |--------|------------------------------|------------------------|
//! | server | [`ArgumentResolver`]         | inbound event          |
//! | server | [`ReturnValueConverter`]     | requested content type |
//! | client | [`RequestArgumentConverter`] | configured content type|
//! | client | [`ResponseConverter`]        | response event         |
//! | client | [`ErrorTranslator`]          | error descriptor       |
//!
//! Values cross the converters in the format-neutral [`serde_json::Value`]
//! model. [`JsonConverter`] and [`TextConverter`] implement every byte-level
//! role; [`FrameworkErrorTranslator`] and [`RemoteErrorTranslator`] are the
//! default error translators.
//!
//! # Examples
//!
//! ```rust
//! use crirpc::converter::ServerConverters;
//!
//! let converters = ServerConverters::default();
//! let encoder = converters.return_value_converters.resolve("application/json").unwrap();
//! assert_eq!(encoder.content_type(), "application/json");
//! ```

mod chain;
mod error;
mod json;
mod registry;
mod text;
mod traits;
mod translate;

pub use chain::{ConverterChain, Supports};
pub use error::ConversionError;
pub use json::{APPLICATION_JSON, JsonConverter};
pub use registry::{ClientConverters, ServerConverters};
pub use text::{TEXT_PLAIN, TextConverter};
pub use traits::{
    ArgumentResolver, ErrorTranslator, RequestArgumentConverter, ResponseConverter,
    ReturnValueConverter,
};
pub use translate::{FrameworkErrorTranslator, RemoteErrorTranslator};

/// Compares a content type header against a media type.
///
/// Parameters such as `; charset=utf-8` are ignored and the comparison is
/// case-insensitive.
///
/// ```rust
/// use crirpc::converter::media_type_matches;
///
/// assert!(media_type_matches("text/plain; charset=utf-8", "text/plain"));
/// assert!(!media_type_matches("text/html", "text/plain"));
/// ```
#[must_use]
pub fn media_type_matches(content_type: &str, media_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case(media_type))
}
