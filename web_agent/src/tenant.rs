// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use agent_did::Did;

use crate::error::Error;
use crate::error::Result;

/// Determines the DID under whose authority a data-store operation runs.
///
/// Precedence: an explicitly passed tenant, then the subject of the
/// operation, then the agent's own DID. The function is pure; callers pass
/// whatever of the three they have.
pub fn resolve_tenant(explicit: Option<&Did>, subject: Option<&Did>, agent: Option<&Did>) -> Result<Did> {
  explicit
    .or(subject)
    .or(agent)
    .cloned()
    .ok_or(Error::TenantResolutionFailed)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn did(name: &str) -> Did {
    Did::parse(format!("did:example:{name}")).unwrap()
  }

  #[test]
  fn test_precedence() {
    let explicit: Did = did("explicit");
    let subject: Did = did("subject");
    let agent: Did = did("agent");

    assert_eq!(
      resolve_tenant(Some(&explicit), Some(&subject), Some(&agent)).unwrap(),
      explicit
    );
    assert_eq!(resolve_tenant(None, Some(&subject), Some(&agent)).unwrap(), subject);
    assert_eq!(resolve_tenant(None, None, Some(&agent)).unwrap(), agent);
  }

  #[test]
  fn test_no_candidates_fails() {
    assert!(matches!(
      resolve_tenant(None, None, None),
      Err(Error::TenantResolutionFailed)
    ));
  }
}
