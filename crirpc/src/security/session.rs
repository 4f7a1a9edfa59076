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

//! Participants and sessions.

use crate::address::Address;
use crate::security::pattern::{PathPattern, PatternError};
use crate::security::permissions::{Permissions, check_target};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

/// An authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    /// Participant id.
    pub id: String,
    /// Owning tenant, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    /// Assigned roles.
    #[serde(default)]
    pub roles: Vec<String>,
    /// Free-form attributes.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Participant {
    /// Creates a participant with no tenant, roles or attributes.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tenant_id: None,
            roles: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    /// Sets the tenant.
    #[must_use]
    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Adds a role.
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    /// Returns `true` if the participant has `role`.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// A participant bound to its permissions.
///
/// Every check records the time in [`last_used`](Self::last_used). Besides
/// the fixed [`Permissions`], a session holds one-shot send grants: each
/// allows exactly one future send to a matching address and is consumed by
/// it.
///
/// # Examples
///
/// ```rust
/// use crirpc::address::Address;
/// use crirpc::security::{Participant, Permissions, Session};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let session = Session::new(Participant::new("alice"), Permissions::new());
/// let reply = Address::parse("srv://bob@rpc.reply/42")?;
///
/// session.add_temporary_send_allowed("srv://bob@rpc.reply/*")?;
/// assert!(session.send_allowed(&reply));
/// assert!(!session.send_allowed(&reply));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    participant: Participant,
    permissions: Permissions,
    created: DateTime<Utc>,
    last_used: Mutex<DateTime<Utc>>,
    temporary_send: Mutex<Vec<PathPattern>>,
}

impl Session {
    /// Opens a session.
    pub fn new(participant: Participant, permissions: Permissions) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            participant,
            permissions,
            created: now,
            last_used: Mutex::new(now),
            temporary_send: Mutex::new(Vec::new()),
        }
    }

    /// Session id.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The bound participant.
    #[must_use]
    pub fn participant(&self) -> &Participant {
        &self.participant
    }

    /// The fixed permissions.
    #[must_use]
    pub fn permissions(&self) -> &Permissions {
        &self.permissions
    }

    /// When the session was opened.
    #[must_use]
    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    /// When the session was last checked.
    #[must_use]
    pub fn last_used(&self) -> DateTime<Utc> {
        *self.last_used.lock()
    }

    /// Returns `true` if sending to `address` is allowed.
    ///
    /// A matching one-shot grant is consumed only when the fixed permissions
    /// do not already allow the send.
    pub fn send_allowed(&self, address: &Address) -> bool {
        self.touch();
        if self.permissions.send_allowed(address) {
            return true;
        }
        let target = check_target(address);
        let mut temporary = self.temporary_send.lock();
        match temporary.iter().position(|p| p.matches(&target)) {
            Some(index) => {
                let grant = temporary.remove(index);
                debug!(participant = %self.participant.id, pattern = %grant, address = %address, "temporary send grant consumed");
                true
            }
            None => false,
        }
    }

    /// Returns `true` if listening on `address` is allowed.
    pub fn subscribe_allowed(&self, address: &Address) -> bool {
        self.touch();
        self.permissions.subscribe_allowed(address)
    }

    /// Allows exactly one future send to an address matching `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] if the pattern does not compile.
    pub fn add_temporary_send_allowed(&self, pattern: &str) -> Result<(), PatternError> {
        let pattern = PathPattern::new(pattern)?;
        self.temporary_send.lock().push(pattern);
        Ok(())
    }

    /// Withdraws an unused one-shot grant. Returns `true` if one was removed.
    pub fn remove_temporary_send_allowed(&self, pattern: &str) -> bool {
        let mut temporary = self.temporary_send.lock();
        match temporary.iter().position(|p| p.as_str() == pattern) {
            Some(index) => {
                temporary.remove(index);
                true
            }
            None => false,
        }
    }

    fn touch(&self) {
        *self.last_used.lock() = Utc::now();
    }
}
