//! Operator Registry
//!
//! Maps operator tokens to comparison strategies. Seeded with the default
//! token set at startup and read-only afterwards; additional bindings can be
//! registered before the registry is frozen behind an `Arc`.

use std::collections::HashMap;

use gate_core::{GateError, GateResult};

use crate::engine::operators::{EqualityOp, NullOp, OperatorStrategy, OrderingOp, PatternOp};

/// Operator used when a payload does not name one
pub const DEFAULT_OPERATOR: &str = "==";

/// Default token set, in the order it is reported to callers
const DEFAULT_BINDINGS: &[(&str, OperatorStrategy)] = &[
    ("==", OperatorStrategy::Equality(EqualityOp::Equal)),
    ("!=", OperatorStrategy::Equality(EqualityOp::NotEqual)),
    (">", OperatorStrategy::Ordering(OrderingOp::Greater)),
    ("<", OperatorStrategy::Ordering(OrderingOp::Less)),
    (">=", OperatorStrategy::Ordering(OrderingOp::GreaterOrEqual)),
    ("<=", OperatorStrategy::Ordering(OrderingOp::LessOrEqual)),
    ("%like%", OperatorStrategy::PatternMatch(PatternOp::Contains)),
    ("like%", OperatorStrategy::PatternMatch(PatternOp::Prefix)),
    ("%like", OperatorStrategy::PatternMatch(PatternOp::Suffix)),
    ("IS NULL", OperatorStrategy::NullCheck(NullOp::IsNull)),
    ("IS NOT NULL", OperatorStrategy::NullCheck(NullOp::IsNotNull)),
];

/// Lookup key: trimmed, whitespace-collapsed, lower-cased
fn normalize_token(token: &str) -> String {
    token
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[derive(Debug, Clone)]
struct Binding {
    token: String,
    strategy: OperatorStrategy,
}

/// Registry that holds every accepted operator token
#[derive(Debug, Clone)]
pub struct OperatorRegistry {
    bindings: HashMap<String, Binding>,
    order: Vec<String>,
}

impl OperatorRegistry {
    /// Creates a new empty registry
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Creates a registry seeded with the default token set
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for (token, strategy) in DEFAULT_BINDINGS {
            registry.register(token, *strategy);
        }
        registry
    }

    /// Binds `token` to `strategy`, replacing any existing binding.
    ///
    /// Tokens are matched case-insensitively; `token` as given becomes the
    /// canonical spelling.
    pub fn register(&mut self, token: &str, strategy: OperatorStrategy) {
        let key = normalize_token(token);
        if !self.bindings.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.bindings.insert(
            key,
            Binding {
                token: token.trim().to_string(),
                strategy,
            },
        );
    }

    /// Resolves a token to its strategy
    pub fn resolve(&self, token: &str) -> GateResult<OperatorStrategy> {
        self.lookup(token)
            .map(|binding| binding.strategy)
            .ok_or_else(|| self.unknown_operator())
    }

    /// Canonical spelling of `token`, if it is registered
    pub fn canonical(&self, token: &str) -> GateResult<String> {
        self.lookup(token)
            .map(|binding| binding.token.clone())
            .ok_or_else(|| self.unknown_operator())
    }

    pub fn contains(&self, token: &str) -> bool {
        self.lookup(token).is_some()
    }

    /// Lists all registered tokens in registration order
    pub fn tokens(&self) -> Vec<&str> {
        self.order
            .iter()
            .filter_map(|key| self.bindings.get(key))
            .map(|binding| binding.token.as_str())
            .collect()
    }

    /// Returns the number of registered tokens
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns true if no tokens are registered
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    fn lookup(&self, token: &str) -> Option<&Binding> {
        self.bindings.get(&normalize_token(token))
    }

    // The rejected token is not echoed; it is arbitrary payload text.
    fn unknown_operator(&self) -> GateError {
        GateError::validation(format!(
            "Unsupported operator; allowed operators: {}",
            self.tokens().join(", ")
        ))
    }
}

impl Default for OperatorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
