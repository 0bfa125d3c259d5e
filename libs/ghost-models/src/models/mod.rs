//! API models

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Returned when a wire string does not name a known value
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}' (expected one of: {expected})")]
pub struct UnknownValue {
    pub kind: &'static str,
    pub value: String,
    pub expected: String,
}

/// Declares a string-backed enum with its wire names.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($(#[$vmeta:meta])* $variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $wire)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::models::UnknownValue;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    _ => Err($crate::models::UnknownValue {
                        kind: $kind,
                        value: s.to_string(),
                        expected: [$($wire),+].join(", "),
                    }),
                }
            }
        }
    };
}

pub(crate) use wire_enum;

mod job;
mod strategy;

pub use job::{JobCommand, JobPayload, JobStatus};
pub use strategy::{
    DeploymentStrategy, SafeDeploymentStrategy, ScriptExecutionStrategy, SwapStrategy,
};

/// Pagination metadata of a list response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListMeta {
    pub max_results: u64,
    pub total: u64,
    pub page: u64,
}

/// List response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse<T> {
    #[serde(rename = "_items", default = "Vec::new")]
    pub items: Vec<T>,

    #[serde(rename = "_meta")]
    pub meta: ListMeta,
}

/// Response to a resource creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedResponse {
    #[serde(rename = "_id")]
    pub id: String,
}

/// A module to deploy, optionally pinned to a revision.
///
/// A missing revision lets the server deploy HEAD.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRef {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
}

impl ModuleRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rev: None,
        }
    }

    pub fn with_rev(name: impl Into<String>, rev: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rev: Some(rev.into()),
        }
    }
}

/// Parses `name` or `name:revision`
impl FromStr for ModuleRef {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || UnknownValue {
            kind: "module reference",
            value: s.to_string(),
            expected: "name or name:revision".to_string(),
        };

        let (name, rev) = match s.split_once(':') {
            Some((name, rev)) => (name, Some(rev)),
            None => (s, None),
        };

        if name.is_empty() || rev.is_some_and(|r| r.is_empty() || r.contains(':')) {
            return Err(invalid());
        }

        Ok(Self {
            name: name.to_string(),
            rev: rev.map(str::to_string),
        })
    }
}

impl fmt::Display for ModuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.rev {
            Some(rev) => write!(f, "{}:{}", self.name, rev),
            None => f.write_str(&self.name),
        }
    }
}
