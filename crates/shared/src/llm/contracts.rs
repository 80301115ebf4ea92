use schemars::{JsonSchema, schema_for};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The only reply shapes the assistant model may produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum AiResponse {
    Answer {
        text: String,
    },
    Recommendation {
        text: String,
        #[serde(rename = "simulationId")]
        simulation_id: String,
    },
    GeneratedExample {
        text: String,
        steps: Vec<GeneratedStep>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct GeneratedStep {
    pub title: String,
    pub content: String,
}

impl AiResponse {
    pub fn answer(text: impl Into<String>) -> Self {
        Self::Answer { text: text.into() }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Answer { text }
            | Self::Recommendation { text, .. }
            | Self::GeneratedExample { text, .. } => text.as_str(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Answer { .. } => "answer",
            Self::Recommendation { .. } => "recommendation",
            Self::GeneratedExample { .. } => "generated_example",
        }
    }

    pub fn recommended_simulation(&self) -> Option<&str> {
        match self {
            Self::Recommendation { simulation_id, .. } => Some(simulation_id.as_str()),
            Self::Answer { .. } | Self::GeneratedExample { .. } => None,
        }
    }
}

pub fn response_schema() -> Value {
    serde_json::to_value(schema_for!(AiResponse))
        .expect("ai response schema should be serializable")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{AiResponse, GeneratedStep, response_schema};

    #[test]
    fn recommendation_uses_camel_case_simulation_id() {
        let response = AiResponse::Recommendation {
            text: "Try this one.".to_string(),
            simulation_id: "wallet-setup".to_string(),
        };

        assert_eq!(
            serde_json::to_value(&response).expect("response should encode"),
            json!({
                "type": "recommendation",
                "text": "Try this one.",
                "simulationId": "wallet-setup"
            })
        );
        assert_eq!(response.recommended_simulation(), Some("wallet-setup"));
    }

    #[test]
    fn generated_example_decodes_steps_in_order() {
        let decoded: AiResponse = serde_json::from_value(json!({
            "type": "generated_example",
            "text": "Here is how a fee bump works.",
            "steps": [
                {"title": "Broadcast", "content": "You send with a low fee."},
                {"title": "Replace", "content": "You re-sign with a higher fee."}
            ]
        }))
        .expect("generated example should decode");

        let AiResponse::GeneratedExample { steps, .. } = decoded else {
            panic!("expected generated example");
        };
        assert_eq!(
            steps[1],
            GeneratedStep {
                title: "Replace".to_string(),
                content: "You re-sign with a higher fee.".to_string(),
            }
        );
    }

    #[test]
    fn schema_lists_all_three_tags() {
        let encoded = response_schema().to_string();
        for tag in ["answer", "recommendation", "generated_example"] {
            assert!(encoded.contains(&format!("\"{tag}\"")), "missing {tag}");
        }
    }
}
