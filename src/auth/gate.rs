// SPDX-License-Identifier: Apache-2.0

//! Authentication gate
//!
//! Two factors: the caller's network address must be covered by an
//! allow-list entry, and the credential presented must equal that entry's
//! credential. Every failure surfaces to the caller as the same generic
//! `Unauthorized`; the precise reason is kept for the audit trail.

use std::net::IpAddr;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use gate_core::{AuthFailure, GateError, GateResult};

use super::address::{self, AddressPattern};
use super::credential;
use crate::observability::Sensitive;

/// Compared against when no entry matches, so both failure paths perform one
/// constant-time comparison.
const DUMMY_CREDENTIAL: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// A configured (address-or-CIDR, credential, label) triple.
///
/// Validated on construction and immutable afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct AllowListEntry {
    address: String,
    #[serde(skip)]
    pattern: AddressPattern,
    credential: Sensitive<String>,
    label: String,
}

impl AllowListEntry {
    pub fn new(
        address: impl Into<String>,
        credential: impl Into<String>,
        label: impl Into<String>,
    ) -> GateResult<Self> {
        let address = address.into().trim().to_string();
        let credential = credential.into().trim().to_string();
        let label = label.into();

        if !credential::is_valid_format(&credential) {
            return Err(GateError::validation(format!(
                "allow-list entry '{label}': credential must be {} hex characters",
                credential::CREDENTIAL_HEX_LEN
            )));
        }

        let pattern = AddressPattern::parse(&address).map_err(|e| {
            GateError::validation(format!(
                "allow-list entry '{label}': {}",
                e.public_message()
            ))
        })?;

        Ok(Self {
            address,
            pattern,
            credential: Sensitive::new(credential),
            label,
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    fn covers(&self, raw: &str, candidate: Option<IpAddr>) -> bool {
        address::entry_covers(raw, candidate, &self.address, Some(&self.pattern))
    }
}

/// The caller an authenticated request runs as
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticatedCaller {
    pub label: String,
    pub address: String,
}

/// Checks callers against an immutable allow-list snapshot
#[derive(Debug, Clone)]
pub struct AuthGate {
    entries: Arc<[AllowListEntry]>,
}

impl AuthGate {
    pub fn new(entries: impl Into<Arc<[AllowListEntry]>>) -> Self {
        Self {
            entries: entries.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Authorizes `address` presenting `credential`.
    ///
    /// The first entry whose address covers the caller decides; its
    /// credential is the only one compared.
    pub fn authenticate(&self, address: &str, credential: &str) -> GateResult<AuthenticatedCaller> {
        let (raw, candidate) = address::candidate(address);

        let Some(entry) = self.entries.iter().find(|e| e.covers(raw, candidate)) else {
            let _ = credential::validate(credential, DUMMY_CREDENTIAL);
            debug!(address = %raw, "no allow-list entry covers caller");
            return Err(GateError::unauthorized(AuthFailure::AddressNotAllowed));
        };

        match credential::validate(credential, entry.credential.expose()) {
            Ok(true) => Ok(AuthenticatedCaller {
                label: entry.label.clone(),
                address: raw.to_string(),
            }),
            // Malformed and wrong credentials are indistinguishable to the caller.
            Ok(false) | Err(_) => {
                debug!(address = %raw, label = %entry.label, "credential rejected");
                Err(GateError::unauthorized(AuthFailure::InvalidCredential))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::net::Ipv4Addr;

    const KEY_A: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const KEY_B: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

    fn gate() -> AuthGate {
        AuthGate::new(vec![
            AllowListEntry::new("10.0.0.1", KEY_A, "ci-runner").unwrap(),
            AllowListEntry::new("192.168.1.0/24", KEY_B, "office").unwrap(),
        ])
    }

    fn reason(err: GateError) -> AuthFailure {
        match err {
            GateError::Unauthorized { reason } => reason,
            other => panic!("expected Unauthorized, got {other:?}"),
        }
    }

    #[test]
    fn valid_address_and_credential_authenticate() {
        let caller = gate().authenticate("10.0.0.1", KEY_A).unwrap();
        assert_eq!(caller.label, "ci-runner");

        let caller = gate().authenticate("192.168.1.77", &KEY_B.to_uppercase()).unwrap();
        assert_eq!(caller.label, "office");
    }

    #[test]
    fn unknown_address_is_rejected() {
        let err = gate().authenticate("172.16.0.1", KEY_A).unwrap_err();
        assert_eq!(reason(err), AuthFailure::AddressNotAllowed);
    }

    #[test]
    fn credential_of_another_entry_is_rejected() {
        let err = gate().authenticate("10.0.0.1", KEY_B).unwrap_err();
        assert_eq!(reason(err), AuthFailure::InvalidCredential);
    }

    #[test]
    fn malformed_and_wrong_credentials_look_the_same() {
        let malformed = gate().authenticate("10.0.0.1", "short").unwrap_err();
        let wrong = gate().authenticate("10.0.0.1", KEY_B).unwrap_err();
        assert_eq!(malformed.to_string(), wrong.to_string());
        assert_eq!(malformed.public_message(), wrong.public_message());
        assert_eq!(reason(malformed), AuthFailure::InvalidCredential);
    }

    #[test]
    fn empty_allow_list_rejects_everyone() {
        let gate = AuthGate::new(Vec::<AllowListEntry>::new());
        assert!(gate.is_empty());
        let err = gate.authenticate("127.0.0.1", KEY_A).unwrap_err();
        assert_eq!(err.public_message(), "Unauthorized");
    }

    #[test]
    fn first_covering_entry_decides() {
        let gate = AuthGate::new(vec![
            AllowListEntry::new("10.0.0.0/8", KEY_A, "wide").unwrap(),
            AllowListEntry::new("10.0.0.1", KEY_B, "narrow").unwrap(),
        ]);
        assert_eq!(gate.authenticate("10.0.0.1", KEY_A).unwrap().label, "wide");
        assert_eq!(
            reason(gate.authenticate("10.0.0.1", KEY_B).unwrap_err()),
            AuthFailure::InvalidCredential
        );
    }

    #[test]
    fn entry_construction_validates_invariants() {
        assert!(AllowListEntry::new("10.0.0.1", "nothex", "x").is_err());
        assert!(AllowListEntry::new("10.0.0.0/40", KEY_A, "x").is_err());
        assert!(AllowListEntry::new("localhost", KEY_A, "x").is_err());
        assert!(AllowListEntry::new("2001:db8::/32", KEY_A, "x").is_ok());
    }

    #[test]
    fn entry_debug_redacts_credential() {
        let entry = AllowListEntry::new("10.0.0.1", KEY_A, "ci").unwrap();
        let rendered = format!("{entry:?}");
        assert!(!rendered.contains(KEY_A));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn gate_and_matcher_agree_on_edge_entries() {
        let cases = [
            ("10.0.0.0/8", "10.9.9.9"),
            ("192.168.1.0/24", "::ffff:192.168.1.5"),
            ("10.0.0.1", " 10.0.0.1 "),
            ("::/0", "10.0.0.1"),
            ("2001:db8::/32", "2001:db8::1"),
        ];
        for (entry, caller) in cases {
            let gate = AuthGate::new(vec![AllowListEntry::new(entry, KEY_A, "x").unwrap()]);
            assert_eq!(
                gate.authenticate(caller, KEY_A).is_ok(),
                address::matches(caller, &[entry]),
                "{entry} vs {caller}"
            );
        }
    }

    proptest! {
        #[test]
        fn gate_admits_exactly_the_addresses_matcher_allows(
            net in any::<u32>(),
            ip in any::<u32>(),
            prefix in 0u8..=32,
        ) {
            let entry = format!("{}/{}", Ipv4Addr::from(net), prefix);
            let caller = Ipv4Addr::from(ip).to_string();
            let gate = AuthGate::new(vec![AllowListEntry::new(entry.as_str(), KEY_A, "x").unwrap()]);
            prop_assert_eq!(
                gate.authenticate(&caller, KEY_A).is_ok(),
                address::matches(&caller, &[entry.as_str()])
            );
        }
    }
}
