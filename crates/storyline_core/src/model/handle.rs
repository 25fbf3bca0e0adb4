//! Opaque handles for project tree entries.
//!
//! # Responsibility
//! - Define the fixed-length identifier shared by tree, sorter and repository.
//! - Generate fresh handles from a SHA-256 digest of time, counter and seed.
//!
//! # Invariants
//! - A `Handle` is always exactly `HANDLE_LEN` lowercase hex characters.
//! - Generation never returns a candidate the caller reports as taken.
//! - Generation retries are bounded by `MAX_HANDLE_ATTEMPTS`.

use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

/// Number of hex characters in every handle.
pub const HANDLE_LEN: usize = 13;

/// Upper bound on digest attempts for one `generate` call.
pub const MAX_HANDLE_ATTEMPTS: usize = 64;

static HANDLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9a-f]{13}$").expect("valid handle regex"));

/// Stable identifier of one tree entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Handle(String);

impl Handle {
    /// Parses a persisted or user-provided handle.
    ///
    /// Surrounding whitespace is ignored; everything else must already be in
    /// canonical lowercase form.
    pub fn parse(value: &str) -> Result<Self, HandleParseError> {
        let trimmed = value.trim();
        if !HANDLE_RE.is_match(trimmed) {
            return Err(HandleParseError {
                value: trimmed.to_string(),
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Handle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Handle {
    type Err = HandleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Handle {
    type Error = HandleParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Handle> for String {
    fn from(value: Handle) -> Self {
        value.0
    }
}

/// Malformed handle text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandleParseError {
    pub value: String,
}

impl Display for HandleParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid handle `{}`; expected {HANDLE_LEN} lowercase hex characters",
            self.value
        )
    }
}

impl Error for HandleParseError {}

/// Digest-based handle source owned by one tree instance.
///
/// The internal counter changes on every attempt, so two candidates drawn in
/// the same clock tick still differ.
#[derive(Debug, Clone, Default)]
pub struct HandleGenerator {
    counter: u64,
}

impl HandleGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a handle for which `is_taken` is false.
    ///
    /// Each collision perturbs the seed and retries. Returns `None` only after
    /// `MAX_HANDLE_ATTEMPTS` consecutive collisions.
    pub fn generate(&mut self, seed: &str, is_taken: impl Fn(&Handle) -> bool) -> Option<Handle> {
        let mut seed = seed.to_string();
        for attempt in 1..=MAX_HANDLE_ATTEMPTS {
            let candidate = self.next_candidate(&seed);
            if !is_taken(&candidate) {
                return Some(candidate);
            }
            warn!(
                "event=handle_collision module=tree status=retry attempt={} handle={}",
                attempt, candidate
            );
            seed.push('!');
        }
        None
    }

    fn next_candidate(&mut self, seed: &str) -> Handle {
        self.counter = self.counter.wrapping_add(1);
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos())
            .unwrap_or_default();

        let mut hasher = Sha256::new();
        hasher.update(nanos.to_le_bytes());
        hasher.update(self.counter.to_le_bytes());
        hasher.update(seed.as_bytes());
        let digest = hasher.finalize();

        let mut text = String::with_capacity(HANDLE_LEN + 1);
        for byte in digest.iter() {
            if text.len() >= HANDLE_LEN {
                break;
            }
            text.push_str(&format!("{byte:02x}"));
        }
        text.truncate(HANDLE_LEN);
        Handle(text)
    }
}
