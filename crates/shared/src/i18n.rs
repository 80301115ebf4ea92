//! User-facing text lookup.
//!
//! Every status or fallback message the assistant or the post store shows to a
//! reader goes through [`Translator::t`], so hosts can swap in their own
//! message tables.

pub mod keys {
    pub const ASSISTANT_UNEXPECTED: &str = "assistant.error.unexpected";
    pub const ASSISTANT_UNAVAILABLE: &str = "assistant.error.unavailable";
    pub const ASSISTANT_PROCESSING: &str = "assistant.error.processing";
    pub const ASSISTANT_WELCOME: &str = "assistant.welcome";
    pub const ASSISTANT_THINKING: &str = "assistant.thinking";
    pub const ASSISTANT_OPEN_SIMULATION: &str = "assistant.recommendation.open";
    pub const ASSISTANT_EXAMPLE_HEADING: &str = "assistant.example.heading";
    pub const SIMULATION_OPENING: &str = "simulation.opening";
    pub const SIMULATION_NONE_RECOMMENDED: &str = "simulation.none_recommended";
    pub const POSTS_EMPTY: &str = "posts.empty";
    pub const POSTS_CREATED: &str = "posts.created";
}

pub trait Translator: Send + Sync {
    fn t(&self, key: &str) -> String;
}

impl<F> Translator for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn t(&self, key: &str) -> String {
        self(key)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Locale {
    #[default]
    En,
    Es,
}

impl Locale {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "en" | "en-us" | "en_us" => Some(Self::En),
            "es" | "es-es" | "es_es" => Some(Self::Es),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Es => "es",
        }
    }
}

impl Translator for Locale {
    /// Falls back to English, then to the key itself.
    fn t(&self, key: &str) -> String {
        lookup(*self, key)
            .or_else(|| lookup(Locale::En, key))
            .unwrap_or(key)
            .to_string()
    }
}

fn lookup(locale: Locale, key: &str) -> Option<&'static str> {
    let text = match (locale, key) {
        (Locale::En, keys::ASSISTANT_UNEXPECTED) => {
            "I received an unexpected response. Please try rephrasing your question."
        }
        (Locale::En, keys::ASSISTANT_UNAVAILABLE) => {
            "The assistant is currently unavailable. Please check the configuration and try again later."
        }
        (Locale::En, keys::ASSISTANT_PROCESSING) => {
            "Sorry, something went wrong while processing your question. Please try again."
        }
        (Locale::En, keys::ASSISTANT_WELCOME) => {
            "Hi! Ask me anything about wallets, keys, or staying safe in crypto."
        }
        (Locale::En, keys::ASSISTANT_THINKING) => "Thinking...",
        (Locale::En, keys::ASSISTANT_OPEN_SIMULATION) => "Open simulation",
        (Locale::En, keys::ASSISTANT_EXAMPLE_HEADING) => "Step-by-step example",
        (Locale::En, keys::SIMULATION_OPENING) => "Opening simulation:",
        (Locale::En, keys::SIMULATION_NONE_RECOMMENDED) => {
            "No simulation has been recommended yet. Ask a question first."
        }
        (Locale::En, keys::POSTS_EMPTY) => "No posts yet.",
        (Locale::En, keys::POSTS_CREATED) => "Post published.",

        (Locale::Es, keys::ASSISTANT_UNEXPECTED) => {
            "Recibí una respuesta inesperada. Intenta reformular tu pregunta."
        }
        (Locale::Es, keys::ASSISTANT_UNAVAILABLE) => {
            "El asistente no está disponible en este momento. Revisa la configuración e inténtalo más tarde."
        }
        (Locale::Es, keys::ASSISTANT_PROCESSING) => {
            "Lo sentimos, ocurrió un error al procesar tu pregunta. Inténtalo de nuevo."
        }
        (Locale::Es, keys::ASSISTANT_WELCOME) => {
            "¡Hola! Pregúntame sobre billeteras, claves o cómo mantenerte seguro en cripto."
        }
        (Locale::Es, keys::ASSISTANT_THINKING) => "Pensando...",
        (Locale::Es, keys::ASSISTANT_OPEN_SIMULATION) => "Abrir simulación",
        (Locale::Es, keys::ASSISTANT_EXAMPLE_HEADING) => "Ejemplo paso a paso",
        (Locale::Es, keys::SIMULATION_OPENING) => "Abriendo simulación:",
        (Locale::Es, keys::SIMULATION_NONE_RECOMMENDED) => {
            "Todavía no se ha recomendado ninguna simulación. Haz una pregunta primero."
        }
        (Locale::Es, keys::POSTS_EMPTY) => "Todavía no hay publicaciones.",
        (Locale::Es, keys::POSTS_CREATED) => "Publicación creada.",

        _ => return None,
    };

    Some(text)
}
