pub mod assistant;
pub mod contracts;
pub mod gateway;
pub mod gemini;
pub mod prompts;
pub mod session;
pub mod validation;

pub use assistant::{AskOutcome, AssistantGateway, ConnectError, ModelConnector};
pub use contracts::{AiResponse, GeneratedStep, response_schema};
pub use gateway::{
    ConversationTurn, LlmGateway, LlmGatewayError, LlmGatewayFuture, LlmGatewayRequest,
    LlmGatewayResponse, LlmTokenUsage, TurnRole,
};
pub use gemini::{GeminiConfigError, GeminiConnector, GeminiGateway, GeminiGatewayConfig};
pub use prompts::{SYSTEM_INSTRUCTION, build_user_prompt};
pub use session::{ConversationSession, SessionState};
pub use validation::{ResponseValidationError, parse_reply_text, validate_reply_value};
