// crates/clinical-gate-core/src/model/identifiers.rs
// ============================================================================
// Module: Clinical Gate Identifiers
// Description: Canonical opaque identifiers for rules, sessions, and patients.
// Purpose: Provide strongly typed, serializable identifiers with stable wire forms.
// Dependencies: serde, sha2
// ============================================================================

//! ## Overview
//! Identifiers are opaque and serialize as plain strings or numbers on the
//! wire. Patient identity never appears raw: [`PatientHash`] only accepts a
//! lowercase SHA-256 hex digest, and [`PatientHash::from_identifier`] is the
//! single place where a raw identifier is digested.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::fmt::Write as _;
use std::num::NonZeroU64;

use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;

// ============================================================================
// SECTION: String Identifiers
// ============================================================================

/// Rule identifier assigned by the rules collaborator.
///
/// # Invariants
/// - Opaque UTF-8 string; no normalization is applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(String);

impl RuleId {
    /// Creates a new rule identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Proposed action type (for example `prescription.create`).
///
/// # Invariants
/// - Compared by exact string equality against rule applicability lists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionType(String);

impl ActionType {
    /// Creates a new action type.
    #[must_use]
    pub fn new(action: impl Into<String>) -> Self {
        Self(action.into())
    }

    /// Returns the action type as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Upstream session reference (recording or consultation session).
///
/// # Invariants
/// - Opaque UTF-8 string owned by the upstream platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionRef(String);

impl SessionRef {
    /// Creates a new session reference.
    #[must_use]
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// Returns the reference as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// SECTION: Patient Hash
// ============================================================================

/// Length of a SHA-256 digest rendered as lowercase hex.
const PATIENT_HASH_HEX_LEN: usize = 64;

/// Hashed patient identifier.
///
/// # Invariants
/// - Always a 64 character lowercase hex SHA-256 digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PatientHash(String);

impl PatientHash {
    /// Digests a raw patient identifier.
    #[must_use]
    pub fn from_identifier(raw: &str) -> Self {
        let digest = Sha256::digest(raw.as_bytes());
        let mut hex = String::with_capacity(PATIENT_HASH_HEX_LEN);
        for byte in &digest {
            let _ = write!(hex, "{byte:02x}");
        }
        Self(hex)
    }

    /// Accepts an existing digest, returning `None` when it is not 64 lowercase hex chars.
    #[must_use]
    pub fn from_digest(digest: &str) -> Option<Self> {
        let valid = digest.len() == PATIENT_HASH_HEX_LEN
            && digest.bytes().all(|byte| byte.is_ascii_digit() || (b'a'..=b'f').contains(&byte));
        valid.then(|| Self(digest.to_string()))
    }

    /// Returns the digest as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PatientHash {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_digest(&value)
            .ok_or_else(|| "patient hash must be a lowercase sha-256 hex digest".to_string())
    }
}

impl From<PatientHash> for String {
    fn from(value: PatientHash) -> Self {
        value.0
    }
}

impl fmt::Display for PatientHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// SECTION: Storage Identifiers
// ============================================================================

/// Declares a non-zero numeric identifier assigned by a governance store.
macro_rules! store_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        ///
        /// # Invariants
        /// - Always >= 1 (non-zero, 1-based).
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(NonZeroU64);

        impl $name {
            /// Creates an identifier from a non-zero value.
            #[must_use]
            pub const fn new(id: NonZeroU64) -> Self {
                Self(id)
            }

            /// Creates an identifier from a raw value (returns `None` if zero).
            #[must_use]
            pub fn from_raw(raw: u64) -> Option<Self> {
                NonZeroU64::new(raw).map(Self)
            }

            /// Returns the raw identifier value (always >= 1).
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0.get()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.get().fmt(f)
            }
        }
    };
}

store_identifier!(
    /// Interaction session record identifier.
    InteractionSessionId
);
store_identifier!(
    /// Governance log row identifier.
    GovernanceLogId
);
store_identifier!(
    /// Governance event row identifier.
    GovernanceEventId
);
