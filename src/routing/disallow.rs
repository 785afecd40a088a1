//! Disallow token sets.
//!
//! A disallow set names the methods that are registered but blocked, written
//! as a comma-separated token list such as `"POST,PATCH,DELETE"`.

use std::str::FromStr;

use axum::http::Method;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DisallowError {
    #[error("invalid method token {0:?}")]
    InvalidToken(String),
}

/// Methods to register as disallowed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Disallow {
    methods: Vec<Method>,
}

impl Disallow {
    /// The empty set: everything allowed.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn methods(methods: impl IntoIterator<Item = Method>) -> Self {
        let mut set = Self::default();
        for method in methods {
            if !set.methods.contains(&method) {
                set.methods.push(method);
            }
        }
        set
    }

    pub fn contains(&self, method: &Method) -> bool {
        self.methods.contains(method)
    }

    /// Whether a route for `method` should be registered as allowed.
    pub fn allows(&self, method: &Method) -> bool {
        !self.contains(method)
    }
}

impl FromStr for Disallow {
    type Err = DisallowError;

    /// Tokens are trimmed and case-insensitive; empty tokens are skipped.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut methods = Vec::new();
        for token in s.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let method = Method::from_bytes(token.to_ascii_uppercase().as_bytes())
                .map_err(|_| DisallowError::InvalidToken(token.to_owned()))?;
            methods.push(method);
        }
        Ok(Self::methods(methods))
    }
}
