// crates/clinical-gate-auditor/src/prompt.rs
// ============================================================================
// Module: Audit Prompt
// Description: Single-shot prompt assembly for the integrity audit.
// Purpose: Frame transcript and proposed note for the model.
// Dependencies: none
// ============================================================================

//! ## Overview
//! The system prompt fixes the output contract; the user prompt carries the
//! (possibly anonymized) transcript and note inside tagged sections so the
//! local simulator can read them back.

/// Opening tag of the transcript section.
pub const TRANSCRIPT_OPEN: &str = "<transcript>";
/// Closing tag of the transcript section.
pub const TRANSCRIPT_CLOSE: &str = "</transcript>";
/// Opening tag of the proposed note section.
pub const NOTE_OPEN: &str = "<proposed_note>";
/// Closing tag of the proposed note section.
pub const NOTE_CLOSE: &str = "</proposed_note>";

/// System prompt describing the verdict contract.
pub const SYSTEM_PROMPT: &str = "You are a clinical documentation integrity auditor. Compare the \
PROPOSED NOTE against the TRANSCRIPT it was generated from. Report dosage errors, laterality \
mismatches, omissions, fabrications, and allergy conflicts. Tokens such as [PERSON_x_1] are \
placeholders; repeat them verbatim and never guess their content. Respond with a single JSON \
object with exactly these keys: safety_score (integer 0-100), risk_level (LOW | MODERATE | \
CRITICAL), categories_detected (array of DOSAGE_ERROR | LATERALITY_MISMATCH | OMISSION | \
FABRICATION | ALLERGY_CONFLICT), reasoning_trace (string), clinical_intervention (string).";

/// Builds the user prompt.
#[must_use]
pub fn build_user_prompt(transcript: &str, proposed_note: &str) -> String {
    format!(
        "TRANSCRIPT:\n{TRANSCRIPT_OPEN}\n{transcript}\n{TRANSCRIPT_CLOSE}\n\nPROPOSED NOTE:\n{NOTE_OPEN}\n{proposed_note}\n{NOTE_CLOSE}\n"
    )
}

/// Extracts transcript and note from a user prompt built by [`build_user_prompt`].
#[must_use]
pub fn split_user_prompt(prompt: &str) -> Option<(&str, &str)> {
    let transcript = between(prompt, TRANSCRIPT_OPEN, TRANSCRIPT_CLOSE)?;
    let note = between(prompt, NOTE_OPEN, NOTE_CLOSE)?;
    Some((transcript, note))
}

/// Returns the trimmed text between the first `open` and the last `close`.
fn between<'a>(text: &'a str, open: &str, close: &str) -> Option<&'a str> {
    let start = text.find(open)? + open.len();
    let end = text.rfind(close)?;
    (start <= end).then(|| text[start .. end].trim())
}
