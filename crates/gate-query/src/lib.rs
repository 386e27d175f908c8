// SPDX-License-Identifier: Apache-2.0

//! Safe, parametrized single-row lookups.

pub mod dialect;
pub mod lookup;

pub use dialect::SqlDialect;
pub use lookup::{LookupQuery, RenderedLookup};
