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

//! Method descriptor tables.
//!
//! A published interface is described by an explicit table mapping method
//! names to their parameters and return kind. The supervisor consults it to
//! dispatch inbound calls, the client to pick the return-value handler.

use serde::{Deserialize, Serialize};

/// How a method delivers its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnKind {
    /// Completes without a value.
    Unit,
    /// Produces exactly one value.
    Single,
    /// Produces zero or more values, then completes.
    Multi,
}

impl ReturnKind {
    /// Returns `true` for [`Multi`](Self::Multi).
    #[must_use]
    pub const fn is_multi_value(self) -> bool {
        matches!(self, Self::Multi)
    }
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamDescriptor {
    /// Parameter name, used in diagnostics.
    pub name: String,
}

/// One method of an interface.
///
/// # Examples
///
/// ```rust
/// use crirpc::service::{MethodDescriptor, ReturnKind};
///
/// let method = MethodDescriptor::new("add", &["a", "b"], "(i64, i64)", ReturnKind::Single);
/// assert_eq!(method.arity(), 2);
/// assert!(!method.returns().is_multi_value());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    name: String,
    params: Vec<ParamDescriptor>,
    signature: String,
    returns: ReturnKind,
}

impl MethodDescriptor {
    /// Creates a descriptor.
    pub fn new(
        name: impl Into<String>,
        params: &[&str],
        signature: impl Into<String>,
        returns: ReturnKind,
    ) -> Self {
        Self {
            name: name.into(),
            params: params
                .iter()
                .map(|name| ParamDescriptor {
                    name: (*name).to_string(),
                })
                .collect(),
            signature: signature.into(),
            returns,
        }
    }

    /// Method name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared parameters.
    #[must_use]
    pub fn params(&self) -> &[ParamDescriptor] {
        &self.params
    }

    /// Number of declared parameters.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Type signature of the argument tuple.
    #[must_use]
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Return kind.
    #[must_use]
    pub fn returns(&self) -> ReturnKind {
        self.returns
    }
}

/// The method table of a published interface.
///
/// Methods are keyed by name; overloads are not supported, and adding a
/// method whose name already exists replaces the earlier entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceDescriptor {
    name: String,
    methods: Vec<MethodDescriptor>,
}

impl InterfaceDescriptor {
    /// Creates an empty table.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: Vec::new(),
        }
    }

    /// Adds a method, replacing any with the same name.
    #[must_use]
    pub fn with_method(mut self, method: MethodDescriptor) -> Self {
        self.insert(method);
        self
    }

    pub(crate) fn insert(&mut self, method: MethodDescriptor) {
        match self.methods.iter_mut().find(|m| m.name == method.name) {
            Some(existing) => *existing = method,
            None => self.methods.push(method),
        }
    }

    /// Fully qualified interface name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Looks up a method by name.
    #[must_use]
    pub fn method(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Methods in declaration order.
    pub fn methods(&self) -> impl Iterator<Item = &MethodDescriptor> {
        self.methods.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interface_lookup() {
        let interface = InterfaceDescriptor::new("a.b.Foo")
            .with_method(MethodDescriptor::new("bar", &[], "()", ReturnKind::Unit))
            .with_method(MethodDescriptor::new("ticks", &["n"], "(u32,)", ReturnKind::Multi));

        assert_eq!(interface.name(), "a.b.Foo");
        assert!(interface.method("baz").is_none());
        assert!(interface.method("ticks").unwrap().returns().is_multi_value());
        assert_eq!(interface.methods().count(), 2);
    }

    #[test]
    fn test_same_name_replaces() {
        let interface = InterfaceDescriptor::new("a.b.Foo")
            .with_method(MethodDescriptor::new("bar", &[], "()", ReturnKind::Unit))
            .with_method(MethodDescriptor::new("bar", &["x"], "(i32,)", ReturnKind::Single));

        assert_eq!(interface.methods().count(), 1);
        assert_eq!(interface.method("bar").unwrap().arity(), 1);
    }
}
