//! Environment identity parsing.
//!
//! Deployment environments are named `tier` + optional numeric suffix
//! (`test1`, `stage2`, `prod1`). The identity is parsed exactly once at
//! the boundary; everything downstream works with the typed form.

use std::fmt;

use regex::Regex;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Test,
    Stage,
    Prod,
}

impl Tier {
    pub fn token(&self) -> &'static str {
        match self {
            Tier::Test => "test",
            Tier::Stage => "stage",
            Tier::Prod => "prod",
        }
    }

    /// The tier that code from this tier promotes to, if any.
    pub fn promotion_target(&self) -> Option<Tier> {
        match self {
            Tier::Test => Some(Tier::Stage),
            Tier::Stage => Some(Tier::Prod),
            Tier::Prod => None,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvId {
    pub tier: Tier,
    pub instance: Option<u32>,
}

impl EnvId {
    /// Parse a raw identity. Strict match: one tier token, optional digits,
    /// nothing else. No case folding.
    pub fn parse(raw: &str) -> Result<EnvId> {
        // Compiled per call; identity parsing happens a handful of times per run.
        let pattern = Regex::new(r"^(test|stage|prod)([0-9]*)$")
            .map_err(|e| Error::internal_unexpected(e.to_string()))?;

        let captures = pattern.captures(raw).ok_or_else(|| {
            Error::validation_invalid_argument(
                "identity",
                "Environment identity must be test/stage/prod plus an optional number",
                Some(raw.to_string()),
            )
        })?;

        let tier = match &captures[1] {
            "test" => Tier::Test,
            "stage" => Tier::Stage,
            _ => Tier::Prod,
        };

        let instance = if captures[2].is_empty() {
            None
        } else {
            Some(captures[2].parse::<u32>().map_err(|_| {
                Error::validation_invalid_argument(
                    "identity",
                    "Instance suffix out of range",
                    Some(raw.to_string()),
                )
            })?)
        };

        Ok(EnvId { tier, instance })
    }

    /// Suffix used for ordering multi-instance fan-out. Instances without
    /// a numeric suffix sort last (as zero).
    pub fn sort_suffix(&self) -> u32 {
        self.instance.unwrap_or(0)
    }
}

impl fmt::Display for EnvId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.instance {
            Some(n) => write!(f, "{}{}", self.tier, n),
            None => write!(f, "{}", self.tier),
        }
    }
}
