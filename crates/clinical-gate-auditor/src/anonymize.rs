// crates/clinical-gate-auditor/src/anonymize.rs
// ============================================================================
// Module: Anonymization Boundary
// Description: Reversible tokenization of identifying spans in clinical text.
// Purpose: Keep patient identity inside the trust boundary during remote audits.
// Dependencies: rand, regex, serde
// ============================================================================

//! ## Overview
//! [`Anonymizer::anonymize`] replaces identifying spans (names introduced by
//! an honorific, e-mail, CPF, CNS, phone, date, CEP) with opaque tokens of
//! the form `[PERSON_3f2a9c10_1]`. The middle segment is a random nonce drawn
//! per call and guaranteed absent from the input, so tokens never collide
//! with passthrough text and are never reused across calls.
//!
//! [`rehydrate`] restores every token present in the supplied map and leaves
//! any other text, including unknown tokens, untouched.
//!
//! Security posture: the rehydration map holds raw identifying content; it
//! must stay in process memory and never be logged or persisted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use rand::Rng;
use regex::Captures;
use regex::Regex;
use serde::Serialize;

// ============================================================================
// SECTION: Entity Kinds
// ============================================================================

/// Kind of identifying span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    /// Person name introduced by an honorific or role word.
    Person,
    /// E-mail address.
    Email,
    /// Brazilian taxpayer number (`000.000.000-00`).
    Cpf,
    /// Brazilian national health card number (15 digits).
    Cns,
    /// Phone number.
    Phone,
    /// Calendar date (`dd/mm/yyyy`).
    Date,
    /// Brazilian postal code (`00000-000`).
    Cep,
}

impl EntityKind {
    /// Returns the token label for the kind.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Person => "PERSON",
            Self::Email => "EMAIL",
            Self::Cpf => "CPF",
            Self::Cns => "CNS",
            Self::Phone => "PHONE",
            Self::Date => "DATE",
            Self::Cep => "CEP",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// SECTION: Patterns
// ============================================================================

/// Compiled entity pattern. When `group` is set only that capture is redacted.
struct EntityPattern {
    /// Entity kind.
    kind: EntityKind,
    /// Compiled regex.
    regex: Regex,
    /// Capture group holding the identifying span.
    group: usize,
}

impl EntityPattern {
    /// Compiles a pattern, dropping it when the expression is invalid.
    fn compile(kind: EntityKind, pattern: &str, group: usize) -> Option<Self> {
        Regex::new(pattern).ok().map(|regex| Self {
            kind,
            regex,
            group,
        })
    }
}

/// Entity patterns in priority order; earlier entries win exact-span ties.
static ENTITY_PATTERNS: LazyLock<Vec<EntityPattern>> = LazyLock::new(|| {
    [
        (EntityKind::Email, r"(?i)\b[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}\b", 0),
        (EntityKind::Cpf, r"\b\d{3}\.\d{3}\.\d{3}-\d{2}\b", 0),
        (EntityKind::Cns, r"\b[1-9]\d{2}[ ]?\d{4}[ ]?\d{4}[ ]?\d{4}\b", 0),
        (EntityKind::Date, r"\b(?:0?[1-9]|[12]\d|3[01])/(?:0?[1-9]|1[0-2])/(?:19|20)\d{2}\b", 0),
        (EntityKind::Cep, r"\b\d{5}-\d{3}\b", 0),
        (EntityKind::Phone, r"(?:\+55[ ]?)?(?:\(\d{2}\)|\b\d{2})[ ]?9?\d{4}[- ]?\d{4}\b", 0),
        (
            EntityKind::Person,
            r"(?:\b(?:Sr|Sra|Dr|Dra|Mr|Mrs|Ms)\.|\b[Pp]aciente\b|\b[Pp]atient\b)[ \t]+(\p{Lu}\p{Ll}+(?:[ \t]+(?:d[aeo]s?[ \t]+)?\p{Lu}\p{Ll}+)*)",
            1,
        ),
    ]
    .into_iter()
    .filter_map(|(kind, pattern, group)| EntityPattern::compile(kind, pattern, group))
    .collect()
});

/// Token shape produced by [`Anonymizer`].
static TOKEN_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\[[A-Z]+_[0-9a-f]{8}_\d+\]").ok());

// ============================================================================
// SECTION: Results
// ============================================================================

/// Token-to-original map produced by one anonymization call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RehydrationMap {
    /// Token to original span.
    entries: BTreeMap<String, String>,
}

impl RehydrationMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the original span for a token.
    #[must_use]
    pub fn get(&self, token: &str) -> Option<&str> {
        self.entries.get(token).map(String::as_str)
    }

    /// Returns the number of tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no token was issued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates tokens in lexical order.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Registers a token.
    fn insert(&mut self, token: String, original: String) {
        self.entries.insert(token, original);
    }
}

/// Redaction statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnonymizationStats {
    /// Redacted occurrences per entity kind.
    pub occurrences: BTreeMap<EntityKind, usize>,
    /// Distinct tokens issued.
    pub unique_entities: usize,
}

impl AnonymizationStats {
    /// Total redacted occurrences.
    #[must_use]
    pub fn total(&self) -> usize {
        self.occurrences.values().sum()
    }
}

/// Output of one anonymization call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnonymizationResult {
    /// Text with identifying spans replaced by tokens.
    pub redacted_text: String,
    /// Token-to-original map for this call only.
    pub rehydration_map: RehydrationMap,
    /// Redaction statistics.
    pub stats: AnonymizationStats,
}

// ============================================================================
// SECTION: Anonymizer
// ============================================================================

/// Stateless anonymizer over the built-in entity patterns.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymizer;

impl Anonymizer {
    /// Creates an anonymizer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Replaces identifying spans with per-call tokens.
    #[must_use]
    pub fn anonymize(&self, text: &str) -> AnonymizationResult {
        let spans = detect_spans(text);
        let nonce = fresh_nonce(text);

        let mut redacted = String::with_capacity(text.len());
        let mut map = RehydrationMap::new();
        let mut stats = AnonymizationStats::default();
        let mut issued: BTreeMap<(EntityKind, &str), String> = BTreeMap::new();
        let mut counters: BTreeMap<EntityKind, usize> = BTreeMap::new();
        let mut cursor = 0;

        for span in spans {
            let original = &text[span.start .. span.end];
            let token = issued
                .entry((span.kind, original))
                .or_insert_with(|| {
                    let counter = counters.entry(span.kind).or_insert(0);
                    *counter += 1;
                    let token = format!("[{}_{nonce}_{counter}]", span.kind.label());
                    map.insert(token.clone(), original.to_string());
                    token
                })
                .clone();
            redacted.push_str(&text[cursor .. span.start]);
            redacted.push_str(&token);
            cursor = span.end;
            *stats.occurrences.entry(span.kind).or_insert(0) += 1;
        }
        redacted.push_str(&text[cursor ..]);
        stats.unique_entities = map.len();

        AnonymizationResult {
            redacted_text: redacted,
            rehydration_map: map,
            stats,
        }
    }
}

/// Restores every token present in `map`; other text passes through.
#[must_use]
pub fn rehydrate(text: &str, map: &RehydrationMap) -> String {
    if map.is_empty() {
        return text.to_string();
    }
    let Some(pattern) = (*TOKEN_PATTERN).as_ref() else {
        return text.to_string();
    };
    pattern
        .replace_all(text, |caps: &Captures<'_>| {
            let token = &caps[0];
            map.get(token).unwrap_or(token).to_string()
        })
        .into_owned()
}

// ============================================================================
// SECTION: Span Detection
// ============================================================================

/// Detected identifying span (byte offsets).
#[derive(Debug, Clone, Copy)]
struct Span {
    /// Start offset.
    start: usize,
    /// End offset (exclusive).
    end: usize,
    /// Entity kind.
    kind: EntityKind,
    /// Pattern priority.
    priority: usize,
}

/// Collects non-overlapping spans, preferring earlier and then longer matches.
fn detect_spans(text: &str) -> Vec<Span> {
    let mut candidates = Vec::new();
    for (priority, pattern) in ENTITY_PATTERNS.iter().enumerate() {
        for caps in pattern.regex.captures_iter(text) {
            if let Some(found) = caps.get(pattern.group)
                && !found.as_str().is_empty()
            {
                candidates.push(Span {
                    start: found.start(),
                    end: found.end(),
                    kind: pattern.kind,
                    priority,
                });
            }
        }
    }
    candidates.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then_with(|| b.end.cmp(&a.end))
            .then_with(|| a.priority.cmp(&b.priority))
    });

    let mut accepted: Vec<Span> = Vec::with_capacity(candidates.len());
    let mut covered_until = 0;
    for span in candidates {
        if span.start < covered_until {
            continue;
        }
        covered_until = span.end;
        accepted.push(span);
    }
    accepted
}

/// Draws an 8-hex-digit nonce that does not occur in `text`.
fn fresh_nonce(text: &str) -> String {
    let mut rng = rand::thread_rng();
    loop {
        let nonce = format!("{:08x}", rng.r#gen::<u32>());
        if !text.contains(&nonce) {
            return nonce;
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
