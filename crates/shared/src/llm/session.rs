use std::sync::Arc;

use super::gateway::{
    ConversationTurn, LlmGateway, LlmGatewayError, LlmGatewayRequest, LlmGatewayResponse,
};

/// A multi-turn exchange with one model. Turns are only appended after the
/// model answered, so a failed call leaves the history untouched.
pub struct ConversationSession {
    gateway: Arc<dyn LlmGateway>,
    system_instruction: String,
    turns: Vec<ConversationTurn>,
}

impl ConversationSession {
    pub fn new(gateway: Arc<dyn LlmGateway>, system_instruction: impl Into<String>) -> Self {
        Self {
            gateway,
            system_instruction: system_instruction.into(),
            turns: Vec::new(),
        }
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub async fn send(&mut self, prompt: String) -> Result<LlmGatewayResponse, LlmGatewayError> {
        let request = LlmGatewayRequest {
            system_instruction: self.system_instruction.clone(),
            history: self.turns.clone(),
            prompt: prompt.clone(),
        };

        let response = self.gateway.generate(request).await?;
        self.turns.push(ConversationTurn::user(prompt));
        self.turns.push(ConversationTurn::model(response.text.clone()));
        Ok(response)
    }
}

/// `Uninitialized -> Active`, never back.
pub enum SessionState {
    Uninitialized,
    Active(ConversationSession),
}

impl SessionState {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active(_))
    }
}
