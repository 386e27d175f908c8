// SPDX-License-Identifier: Apache-2.0

//! SQL safety analysis for assumption requests.

pub mod identifier;
pub mod suspicious;

pub use identifier::{
    is_reserved_keyword, validate_identifier, IdentifierRole, MAX_IDENTIFIER_LEN,
    RESERVED_KEYWORDS,
};
pub use suspicious::{detect_suspicious, detect_suspicious_in};
