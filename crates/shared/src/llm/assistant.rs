use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::contracts::AiResponse;
use super::gateway::{ConversationTurn, LlmGateway, LlmGatewayError, LlmTokenUsage};
use super::prompts::{SYSTEM_INSTRUCTION, build_user_prompt};
use super::session::{ConversationSession, SessionState};
use super::validation::parse_reply_text;
use crate::i18n::{Translator, keys};
use crate::simulations::SimulationSummary;

const MAX_LOGGED_REPLY_CHARS: usize = 160;

/// Opens the model client backing a conversation session.
pub trait ModelConnector: Send + Sync {
    fn connect(&self) -> Result<Arc<dyn LlmGateway>, ConnectError>;
}

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("assistant model is not configured: {0}")]
    NotConfigured(String),
    #[error("assistant model client failed to initialize: {0}")]
    ClientInit(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AskOutcome {
    Success,
    /// The model recommended a simulation outside the supplied catalog.
    Downgraded,
    Malformed,
    Unavailable,
    ProcessingError,
}

impl AskOutcome {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Downgraded => "downgraded",
            Self::Malformed => "malformed",
            Self::Unavailable => "unavailable",
            Self::ProcessingError => "processing_error",
        }
    }

    const fn is_failure(self) -> bool {
        matches!(
            self,
            Self::Malformed | Self::Unavailable | Self::ProcessingError
        )
    }
}

/// Turns a reader's question into exactly one [`AiResponse`].
///
/// The conversation session is opened on the first call and reused for the
/// life of this value; build a new gateway to start over. Calls are serialized
/// on the session so turns cannot interleave.
pub struct AssistantGateway {
    connector: Arc<dyn ModelConnector>,
    translator: Arc<dyn Translator>,
    state: Mutex<SessionState>,
}

impl AssistantGateway {
    pub fn new(connector: Arc<dyn ModelConnector>, translator: Arc<dyn Translator>) -> Self {
        Self {
            connector,
            translator,
            state: Mutex::new(SessionState::Uninitialized),
        }
    }

    pub async fn is_active(&self) -> bool {
        self.state.lock().await.is_active()
    }

    pub async fn conversation_turns(&self) -> Vec<ConversationTurn> {
        match &*self.state.lock().await {
            SessionState::Active(session) => session.turns().to_vec(),
            SessionState::Uninitialized => Vec::new(),
        }
    }

    /// Never fails: every error path resolves to an `answer` carrying a
    /// translated fallback message.
    pub async fn ask(&self, message: &str, known_simulations: &[SimulationSummary]) -> AiResponse {
        let started_at = Instant::now();
        let report = self.resolve(message, known_simulations).await;
        log_ask_report(&report, started_at.elapsed());
        report.response
    }

    async fn resolve(&self, message: &str, known_simulations: &[SimulationSummary]) -> AskReport {
        let mut state = self.state.lock().await;

        if !state.is_active() {
            match self.connector.connect() {
                Ok(gateway) => {
                    *state = SessionState::Active(ConversationSession::new(
                        gateway,
                        SYSTEM_INSTRUCTION,
                    ));
                    info!("assistant conversation session started");
                }
                Err(err) => {
                    warn!("assistant model could not be connected: {err}");
                    let (outcome, error_type) = match err {
                        ConnectError::NotConfigured(_) => (AskOutcome::Unavailable, "not_configured"),
                        ConnectError::ClientInit(_) => (AskOutcome::ProcessingError, "client_init"),
                    };
                    return self.fallback(outcome, Some(error_type));
                }
            }
        }

        let SessionState::Active(session) = &mut *state else {
            return self.fallback(AskOutcome::ProcessingError, Some("session_missing"));
        };

        let prompt = match build_user_prompt(message, known_simulations) {
            Ok(prompt) => prompt,
            Err(err) => {
                warn!("failed to encode assistant prompt: {err}");
                return self.fallback(AskOutcome::ProcessingError, Some("prompt_encoding"));
            }
        };

        let reply = match session.send(prompt).await {
            Ok(reply) => reply,
            Err(err) => {
                warn!("assistant provider request failed: {err}");
                let outcome = match err {
                    LlmGatewayError::Unauthorized(_) => AskOutcome::Unavailable,
                    LlmGatewayError::Timeout
                    | LlmGatewayError::ProviderFailure(_)
                    | LlmGatewayError::InvalidProviderPayload(_) => AskOutcome::ProcessingError,
                };
                return self.fallback(outcome, Some(err.error_type()));
            }
        };
        drop(state);

        let (response, outcome, error_type) = match parse_reply_text(&reply.text) {
            Ok(parsed) => {
                let (response, outcome) = enforce_known_simulation(parsed, known_simulations);
                (response, outcome, None)
            }
            Err(err) => {
                warn!(
                    reply = %reply_snippet(&reply.text),
                    "assistant reply rejected: {err}"
                );
                (
                    self.fallback_response(AskOutcome::Malformed),
                    AskOutcome::Malformed,
                    Some("malformed_reply"),
                )
            }
        };

        AskReport {
            response,
            outcome,
            model: Some(reply.model),
            usage: reply.usage,
            error_type,
        }
    }

    fn fallback(&self, outcome: AskOutcome, error_type: Option<&'static str>) -> AskReport {
        AskReport {
            response: self.fallback_response(outcome),
            outcome,
            model: None,
            usage: None,
            error_type,
        }
    }

    fn fallback_response(&self, outcome: AskOutcome) -> AiResponse {
        let key = match outcome {
            AskOutcome::Unavailable => keys::ASSISTANT_UNAVAILABLE,
            AskOutcome::Malformed => keys::ASSISTANT_UNEXPECTED,
            AskOutcome::ProcessingError | AskOutcome::Success | AskOutcome::Downgraded => {
                keys::ASSISTANT_PROCESSING
            }
        };
        AiResponse::answer(self.translator.t(key))
    }
}

struct AskReport {
    response: AiResponse,
    outcome: AskOutcome,
    model: Option<String>,
    usage: Option<LlmTokenUsage>,
    error_type: Option<&'static str>,
}

fn enforce_known_simulation(
    response: AiResponse,
    known_simulations: &[SimulationSummary],
) -> (AiResponse, AskOutcome) {
    match response {
        AiResponse::Recommendation {
            text,
            simulation_id,
        } if !known_simulations
            .iter()
            .any(|simulation| simulation.id == simulation_id) =>
        {
            warn!(
                simulation_id = %simulation_id,
                "assistant recommended an unknown simulation, answering with its text only"
            );
            (AiResponse::Answer { text }, AskOutcome::Downgraded)
        }
        other => (other, AskOutcome::Success),
    }
}

fn reply_snippet(raw: &str) -> String {
    raw.trim().chars().take(MAX_LOGGED_REPLY_CHARS).collect()
}

fn log_ask_report(report: &AskReport, latency: Duration) {
    let latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
    let prompt_tokens = report.usage.as_ref().map(|usage| usage.prompt_tokens);
    let completion_tokens = report.usage.as_ref().map(|usage| usage.completion_tokens);
    let total_tokens = report.usage.as_ref().map(|usage| usage.total_tokens);

    if report.outcome.is_failure() {
        warn!(
            metric_name = "assistant_request",
            outcome = report.outcome.as_str(),
            response_type = report.response.kind(),
            model = ?report.model,
            latency_ms,
            prompt_tokens = ?prompt_tokens,
            completion_tokens = ?completion_tokens,
            total_tokens = ?total_tokens,
            error_type = ?report.error_type,
            "assistant request metrics"
        );
    } else {
        info!(
            metric_name = "assistant_request",
            outcome = report.outcome.as_str(),
            response_type = report.response.kind(),
            model = ?report.model,
            latency_ms,
            prompt_tokens = ?prompt_tokens,
            completion_tokens = ?completion_tokens,
            total_tokens = ?total_tokens,
            "assistant request metrics"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::{AssistantGateway, ConnectError, ModelConnector};
    use crate::i18n::{Locale, Translator, keys};
    use crate::llm::contracts::{AiResponse, GeneratedStep};
    use crate::llm::gateway::{
        LlmGateway, LlmGatewayError, LlmGatewayFuture, LlmGatewayRequest, LlmGatewayResponse,
        TurnRole,
    };
    use crate::llm::prompts::SYSTEM_INSTRUCTION;
    use crate::simulations::SimulationSummary;

    #[derive(Default)]
    struct ScriptedGateway {
        replies: Mutex<VecDeque<Result<String, LlmGatewayError>>>,
        seen: Mutex<Vec<LlmGatewayRequest>>,
    }

    impl ScriptedGateway {
        fn with_replies(replies: Vec<Result<&str, LlmGatewayError>>) -> Arc<Self> {
            let replies = replies
                .into_iter()
                .map(|reply| reply.map(ToString::to_string))
                .collect();
            Arc::new(Self {
                replies: Mutex::new(replies),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn seen(&self) -> Vec<LlmGatewayRequest> {
            self.seen.lock().expect("seen lock").clone()
        }
    }

    impl LlmGateway for ScriptedGateway {
        fn generate<'a>(&'a self, request: LlmGatewayRequest) -> LlmGatewayFuture<'a> {
            Box::pin(async move {
                self.seen.lock().expect("seen lock").push(request);
                let next = self.replies.lock().expect("replies lock").pop_front();
                next.unwrap_or_else(|| Err(LlmGatewayError::ProviderFailure("exhausted".into())))
                    .map(|text| LlmGatewayResponse {
                        model: "scripted-model".to_string(),
                        provider_request_id: None,
                        text,
                        usage: None,
                    })
            })
        }
    }

    struct CountingConnector {
        gateway: Option<Arc<ScriptedGateway>>,
        client_init_fails: bool,
        connects: AtomicUsize,
    }

    impl CountingConnector {
        fn new(gateway: Option<Arc<ScriptedGateway>>) -> Arc<Self> {
            Arc::new(Self {
                gateway,
                client_init_fails: false,
                connects: AtomicUsize::new(0),
            })
        }

        fn failing_client_init() -> Arc<Self> {
            Arc::new(Self {
                gateway: None,
                client_init_fails: true,
                connects: AtomicUsize::new(0),
            })
        }
    }

    impl ModelConnector for CountingConnector {
        fn connect(&self) -> Result<Arc<dyn LlmGateway>, ConnectError> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            if self.client_init_fails {
                return Err(ConnectError::ClientInit("tls backend missing".to_string()));
            }
            match &self.gateway {
                Some(gateway) => {
                    let gateway: Arc<dyn LlmGateway> = gateway.clone();
                    Ok(gateway)
                }
                None => Err(ConnectError::NotConfigured(
                    "missing required env var GEMINI_API_KEY".to_string(),
                )),
            }
        }
    }

    fn catalog() -> Vec<SimulationSummary> {
        vec![
            SimulationSummary {
                id: "wallet-setup".to_string(),
                title: "Set Up a Wallet".to_string(),
                description: "Create a wallet.".to_string(),
            },
            SimulationSummary {
                id: "phishing-detection".to_string(),
                title: "Spot the Phish".to_string(),
                description: "Find the fake.".to_string(),
            },
        ]
    }

    fn assistant(connector: Arc<CountingConnector>) -> AssistantGateway {
        AssistantGateway::new(connector, Arc::new(Locale::En))
    }

    #[tokio::test]
    async fn known_recommendation_is_returned_unchanged() {
        let gateway = ScriptedGateway::with_replies(vec![Ok(
            r#"{"type":"recommendation","text":"Practice here.","simulationId":"wallet-setup"}"#,
        )]);
        let assistant = assistant(CountingConnector::new(Some(gateway)));

        let response = assistant.ask("How do wallets work?", &catalog()).await;

        assert_eq!(
            response,
            AiResponse::Recommendation {
                text: "Practice here.".to_string(),
                simulation_id: "wallet-setup".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn generated_example_passes_through() {
        let gateway = ScriptedGateway::with_replies(vec![Ok(
            r#"{"type":"generated_example","text":"Fees, step by step.","steps":[{"title":"Pick a fee","content":"Higher fees confirm faster."},{"title":"Wait","content":"Miners pick your transaction."}]}"#,
        )]);
        let assistant = assistant(CountingConnector::new(Some(gateway)));

        let response = assistant.ask("Show me how fees work", &catalog()).await;

        let AiResponse::GeneratedExample { steps, .. } = response else {
            panic!("expected generated example, got {response:?}");
        };
        assert_eq!(steps.len(), 2);
        assert_eq!(
            steps[0],
            GeneratedStep {
                title: "Pick a fee".to_string(),
                content: "Higher fees confirm faster.".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn plain_text_reply_yields_unexpected_fallback() {
        let gateway = ScriptedGateway::with_replies(vec![Ok("Sorry, I can't help")]);
        let assistant = assistant(CountingConnector::new(Some(gateway.clone())));

        let response = assistant.ask("hello", &catalog()).await;

        assert_eq!(
            response,
            AiResponse::answer(Locale::En.t(keys::ASSISTANT_UNEXPECTED))
        );
        // The exchange still happened, so the session keeps it.
        assert_eq!(assistant.conversation_turns().await.len(), 2);
    }

    #[tokio::test]
    async fn reply_missing_required_field_yields_unexpected_fallback() {
        let gateway = ScriptedGateway::with_replies(vec![Ok(
            r#"{"type":"generated_example","text":"No steps here"}"#,
        )]);
        let assistant = assistant(CountingConnector::new(Some(gateway)));

        let response = assistant.ask("example please", &catalog()).await;

        assert_eq!(
            response,
            AiResponse::answer(Locale::En.t(keys::ASSISTANT_UNEXPECTED))
        );
    }

    #[tokio::test]
    async fn missing_credential_yields_distinct_unavailable_fallback() {
        let connector = CountingConnector::new(None);
        let assistant = assistant(connector.clone());

        let first = assistant.ask("hello", &catalog()).await;
        let second = assistant.ask("hello again", &catalog()).await;

        let unavailable = Locale::En.t(keys::ASSISTANT_UNAVAILABLE);
        assert_eq!(first, AiResponse::answer(unavailable.clone()));
        assert_eq!(second, AiResponse::answer(unavailable.clone()));
        assert_ne!(unavailable, Locale::En.t(keys::ASSISTANT_UNEXPECTED));
        assert_ne!(unavailable, Locale::En.t(keys::ASSISTANT_PROCESSING));

        assert!(!assistant.is_active().await);
        assert_eq!(connector.connects.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn rejected_credential_yields_unavailable_fallback() {
        let gateway = ScriptedGateway::with_replies(vec![Err(LlmGatewayError::Unauthorized(
            "status=401 code=UNAUTHENTICATED".to_string(),
        ))]);
        let assistant = assistant(CountingConnector::new(Some(gateway)));

        let response = assistant.ask("hello", &catalog()).await;

        assert_eq!(
            response,
            AiResponse::answer(Locale::En.t(keys::ASSISTANT_UNAVAILABLE))
        );
    }

    #[tokio::test]
    async fn transport_failure_yields_processing_fallback_without_recording_turns() {
        let gateway = ScriptedGateway::with_replies(vec![Err(LlmGatewayError::Timeout)]);
        let assistant = assistant(CountingConnector::new(Some(gateway.clone())));

        let response = assistant.ask("hello", &catalog()).await;

        assert_eq!(
            response,
            AiResponse::answer(Locale::En.t(keys::ASSISTANT_PROCESSING))
        );
        assert!(assistant.is_active().await);
        assert!(assistant.conversation_turns().await.is_empty());
        assert_eq!(gateway.seen().len(), 1, "no retry should be attempted");
    }

    #[tokio::test]
    async fn unknown_simulation_recommendation_is_downgraded_to_answer() {
        let gateway = ScriptedGateway::with_replies(vec![Ok(
            r#"{"type":"recommendation","text":"Try the mining lab.","simulationId":"mining-lab"}"#,
        )]);
        let assistant = assistant(CountingConnector::new(Some(gateway)));

        let response = assistant.ask("How is bitcoin mined?", &catalog()).await;

        assert_eq!(response, AiResponse::answer("Try the mining lab."));
    }

    #[tokio::test]
    async fn session_is_opened_once_and_accumulates_turns() {
        let gateway = ScriptedGateway::with_replies(vec![
            Ok(r#"{"type":"answer","text":"A wallet stores keys."}"#),
            Ok(r#"{"type":"answer","text":"Keep the seed offline."}"#),
        ]);
        let connector = CountingConnector::new(Some(gateway.clone()));
        let assistant = assistant(connector.clone());

        assistant.ask("What is a wallet?", &catalog()).await;
        assistant.ask("And the seed?", &catalog()).await;

        assert_eq!(connector.connects.load(Ordering::SeqCst), 1);

        let seen = gateway.seen();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].history.is_empty());
        assert_eq!(seen[1].history.len(), 2);
        assert_eq!(seen[1].history[0].role, TurnRole::User);
        assert!(seen[1].history[0].text.contains("What is a wallet?"));
        assert_eq!(seen[1].history[1].role, TurnRole::Model);
        assert_eq!(seen[1].system_instruction, SYSTEM_INSTRUCTION);
        assert!(seen[1].prompt.contains("And the seed?"));
        assert!(seen[1].prompt.contains("phishing-detection"));

        assert_eq!(assistant.conversation_turns().await.len(), 4);
    }

    #[tokio::test]
    async fn fallback_text_goes_through_the_translator() {
        let translator = |key: &str| format!("<{key}>");
        let assistant =
            AssistantGateway::new(CountingConnector::new(None), Arc::new(translator));

        let response = assistant.ask("hello", &[]).await;

        assert_eq!(
            response,
            AiResponse::answer(format!("<{}>", keys::ASSISTANT_UNAVAILABLE))
        );
    }

    #[tokio::test]
    async fn client_init_failure_is_a_processing_error_not_unavailable() {
        let connector = CountingConnector::failing_client_init();
        let assistant = assistant(connector.clone());

        let response = assistant.ask("hello", &catalog()).await;

        assert_eq!(
            response,
            AiResponse::answer(Locale::En.t(keys::ASSISTANT_PROCESSING))
        );
        assert!(!assistant.is_active().await);
        assert_eq!(connector.connects.load(Ordering::SeqCst), 1);
    }
}
