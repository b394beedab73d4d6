//! Chat model trait: the Model collaborator.
//!
//! The orchestrator treats the model as an opaque request/response service:
//! a transcript plus available tools in, either search requests or a final
//! answer out. Vendor wire formats live in the implementations.

use async_trait::async_trait;

use crate::error::{CollaboratorError, CollaboratorResult};
use crate::types::{ChatMessage, ModelDecision, ToolSpec};

/// Model collaborator.
///
/// `model` is the caller's model identifier; validating it is the
/// implementation's job.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Decide the next step given the transcript and the tools on offer.
    async fn decide(
        &self,
        model: &str,
        messages: &[ChatMessage],
        tools: &[ToolSpec],
    ) -> CollaboratorResult<ModelDecision>;

    /// Plain completion with no tools.
    async fn complete(&self, model: &str, messages: &[ChatMessage]) -> CollaboratorResult<String> {
        match self.decide(model, messages, &[]).await? {
            ModelDecision::Final(text) => Ok(text),
            ModelDecision::Search(_) => Err(CollaboratorError::Protocol(
                "model requested a search when no tools were offered".to_string(),
            )),
        }
    }
}
