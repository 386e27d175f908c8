// SPDX-License-Identifier: Apache-2.0

//! Credential validation and provisioning
//!
//! Credentials are 32 random bytes rendered as 64 hex characters. Comparison
//! goes through `subtle` so its running time does not depend on where the
//! first mismatching byte sits.

use rand::rngs::OsRng;
use rand::RngCore;
use subtle::ConstantTimeEq;

use gate_core::{GateError, GateResult};

/// Length of a credential in hex characters.
pub const CREDENTIAL_HEX_LEN: usize = 64;

const CREDENTIAL_BYTES: usize = CREDENTIAL_HEX_LEN / 2;

/// True if `candidate` is exactly 64 hex characters (any case).
pub fn is_valid_format(candidate: &str) -> bool {
    candidate.len() == CREDENTIAL_HEX_LEN && candidate.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Compares a provided credential against the expected one.
///
/// A malformed `provided` fails fast with [`GateError::InvalidCredentialFormat`];
/// the format of a credential is not secret. Well-formed credentials are
/// compared case-insensitively in constant time.
pub fn validate(provided: &str, expected: &str) -> GateResult<bool> {
    if !is_valid_format(provided) {
        return Err(GateError::InvalidCredentialFormat);
    }

    let provided = provided.to_ascii_lowercase();
    let expected = expected.to_ascii_lowercase();
    Ok(bool::from(provided.as_bytes().ct_eq(expected.as_bytes())))
}

/// Generates a fresh credential from the operating system's CSPRNG.
pub fn generate() -> String {
    let mut bytes = [0u8; CREDENTIAL_BYTES];
    OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
