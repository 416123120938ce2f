//! Response refinement.
//!
//! Turns an evidence block into the final coached reply: one model call
//! carrying the persona, the prior conversation in chronological order,
//! and a closing instruction that grounds the answer in the evidence.

use super::prompts::{COACH_PERSONA, refine_instruction};
use crate::Result;
use crate::llm::{ChatMessage, LlmProvider};
use crate::models::Turn;

/// Produces the final answer from evidence and prior history.
///
/// Does not touch session memory; the orchestrator appends the result.
///
/// # Errors
///
/// Returns an error if the refinement model call fails. This is the one
/// evidence-path failure that is fatal for the turn.
pub(crate) fn refine(llm: &dyn LlmProvider, evidence: &str, prior: &[Turn]) -> Result<String> {
    let mut messages = Vec::with_capacity(prior.len() + 2);
    messages.push(ChatMessage::system(COACH_PERSONA));
    messages.extend(prior.iter().map(ChatMessage::from));
    messages.push(ChatMessage::user(refine_instruction(evidence)));

    let output = llm.complete(&messages)?;
    Ok(output.trim().to_string())
}
