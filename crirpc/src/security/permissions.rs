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

//! Send and subscribe permissions.

use crate::address::Address;
use crate::security::pattern::{PathPattern, PatternError};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Two ordered allow lists of [`PathPattern`]s.
///
/// A candidate address is tested as its base resource followed by `/path`
/// when it has one; the version is ignored. Any matching pattern allows the
/// operation.
///
/// # Examples
///
/// ```rust
/// use crirpc::address::Address;
/// use crirpc::security::Permissions;
///
/// let permissions = Permissions::new().allow_send("srv://*.**")?;
/// assert!(permissions.send_allowed(&Address::parse("srv://a.b.C")?));
/// assert!(!permissions.send_allowed(&Address::parse("evt://a.b.C")?));
/// assert!(!permissions.subscribe_allowed(&Address::parse("srv://a.b.C")?));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permissions {
    #[serde(default)]
    allowed_send: Vec<PathPattern>,
    #[serde(default)]
    allowed_subscribe: Vec<PathPattern>,
}

impl Permissions {
    /// Creates permissions that allow nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a send pattern.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] if the pattern does not compile.
    pub fn allow_send(mut self, pattern: &str) -> Result<Self, PatternError> {
        self.allowed_send.push(PathPattern::new(pattern)?);
        Ok(self)
    }

    /// Adds a subscribe pattern.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] if the pattern does not compile.
    pub fn allow_subscribe(mut self, pattern: &str) -> Result<Self, PatternError> {
        self.allowed_subscribe.push(PathPattern::new(pattern)?);
        Ok(self)
    }

    /// Send patterns in order.
    #[must_use]
    pub fn allowed_send(&self) -> &[PathPattern] {
        &self.allowed_send
    }

    /// Subscribe patterns in order.
    #[must_use]
    pub fn allowed_subscribe(&self) -> &[PathPattern] {
        &self.allowed_subscribe
    }

    /// Returns `true` if sending to `address` is allowed.
    #[must_use]
    pub fn send_allowed(&self, address: &Address) -> bool {
        any_match(&self.allowed_send, address)
    }

    /// Returns `true` if listening on `address` is allowed.
    #[must_use]
    pub fn subscribe_allowed(&self, address: &Address) -> bool {
        any_match(&self.allowed_subscribe, address)
    }
}

/// The string permissions are checked against.
pub(crate) fn check_target(address: &Address) -> Cow<'_, str> {
    match address.path() {
        Some(path) => Cow::Owned(format!("{}/{}", address.base_resource(), path)),
        None => Cow::Borrowed(address.base_resource()),
    }
}

fn any_match(patterns: &[PathPattern], address: &Address) -> bool {
    let target = check_target(address);
    patterns.iter().any(|p| p.matches(&target))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(raw: &str) -> Address {
        Address::parse(raw).unwrap()
    }

    #[test]
    fn test_service_scheme_gate() {
        let permissions = Permissions::new().allow_send("srv://*.**").unwrap();
        assert!(permissions.send_allowed(&addr("srv://a.b.C")));
        assert!(!permissions.send_allowed(&addr("evt://a.b.C")));
    }

    #[test]
    fn test_any_pattern_suffices() {
        let permissions = Permissions::new()
            .allow_subscribe("stream://sensor.Temperature")
            .unwrap()
            .allow_subscribe("stream://{user}@inbox.**")
            .unwrap();
        assert!(permissions.subscribe_allowed(&addr("stream://sensor.Temperature")));
        assert!(permissions.subscribe_allowed(&addr("stream://bob@inbox.Messages")));
        assert!(!permissions.subscribe_allowed(&addr("stream://sensor.Humidity")));
        assert!(!permissions.send_allowed(&addr("stream://sensor.Temperature")));
    }

    #[test]
    fn test_path_is_checked_and_version_ignored() {
        let permissions = Permissions::new().allow_send("srv://calc.Api/add").unwrap();
        assert!(permissions.send_allowed(&addr("srv://calc.Api/add#2")));
        assert!(!permissions.send_allowed(&addr("srv://calc.Api/sub")));
        assert!(!permissions.send_allowed(&addr("srv://calc.Api")));
    }

    #[test]
    fn test_serde_shape() {
        let permissions: Permissions =
            serde_json::from_str(r#"{"allowedSend":["srv://*.**"]}"#).unwrap();
        assert_eq!(permissions.allowed_send().len(), 1);
        assert!(permissions.allowed_subscribe().is_empty());
        assert!(serde_json::from_str::<Permissions>(r#"{"allowedSend":["a.**.b"]}"#).is_err());
    }
}
