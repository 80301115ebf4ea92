use serde::{Deserialize, Serialize};

/// Full catalog record for an interactive simulation. Only the
/// [`SimulationSummary`] projection is ever shared with the assistant model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Simulation {
    pub id: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub xp: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub id: String,
    pub title: String,
    pub description: String,
}

impl From<&Simulation> for SimulationSummary {
    fn from(simulation: &Simulation) -> Self {
        Self {
            id: simulation.id.clone(),
            title: simulation.title.clone(),
            description: simulation.description.clone(),
        }
    }
}

pub trait SimulationCatalog: Send + Sync {
    fn summaries(&self) -> Vec<SimulationSummary>;
}

/// Invoked when a reader picks a recommended simulation.
pub trait SimulationNavigator {
    fn open_simulation(&self, simulation_id: &str);
}

pub fn simulation_route(simulation_id: &str) -> String {
    format!("/simulations/{simulation_id}")
}

#[derive(Debug, Clone, Default)]
pub struct BuiltinSimulations;

impl SimulationCatalog for BuiltinSimulations {
    fn summaries(&self) -> Vec<SimulationSummary> {
        builtin_simulations().iter().map(SimulationSummary::from).collect()
    }
}

fn builtin_simulations() -> Vec<Simulation> {
    [
        (
            "wallet-setup",
            "Set Up a Self-Custody Wallet",
            "Create a wallet step by step and learn what the app does and does not store for you.",
            "wallet",
            100,
        ),
        (
            "seed-phrase-backup",
            "Back Up Your Seed Phrase",
            "Practice writing down, verifying, and safely storing a recovery phrase.",
            "key",
            120,
        ),
        (
            "phishing-detection",
            "Spot the Phishing Attempt",
            "Review emails, links, and pop-ups and decide which ones are trying to steal your keys.",
            "shield",
            150,
        ),
        (
            "transaction-fees",
            "Send a Transaction",
            "Choose a network fee, send funds, and watch how confirmation time changes.",
            "send",
            80,
        ),
        (
            "exchange-vs-self-custody",
            "Exchange vs. Self-Custody",
            "Compare what happens to your funds on an exchange and in a wallet you control.",
            "bank",
            90,
        ),
        (
            "scam-recognition",
            "Recognize Investment Scams",
            "Evaluate offers promising guaranteed returns and learn the common red flags.",
            "alert",
            130,
        ),
    ]
    .into_iter()
    .map(|(id, title, description, icon, xp)| Simulation {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        icon: icon.to_string(),
        xp,
    })
    .collect()
}
