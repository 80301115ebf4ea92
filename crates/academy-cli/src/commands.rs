use std::fs;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use shared::i18n::{Translator, keys};
use shared::llm::AssistantGateway;
use shared::posts::{BlogPost, KeyValueStore, NewPost, PostStore, PostStoreError};
use shared::simulations::{SimulationCatalog, SimulationNavigator, simulation_route};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::signal;
use tracing::info;

use crate::cli::{AddPostArgs, ImageSource};
use crate::render::{render_post_line, render_response};

const QUIT_COMMAND: &str = "/quit";
const OPEN_COMMAND: &str = "/open";

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to read image file {path}: {source}")]
    ReadImage {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    AddPost(#[from] PostStoreError),
    #[error("failed to encode post: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("terminal i/o failed: {0}")]
    Terminal(#[from] std::io::Error),
}

pub struct TerminalNavigator<'a> {
    translator: &'a dyn Translator,
}

impl<'a> TerminalNavigator<'a> {
    pub fn new(translator: &'a dyn Translator) -> Self {
        Self { translator }
    }
}

impl SimulationNavigator for TerminalNavigator<'_> {
    fn open_simulation(&self, simulation_id: &str) {
        println!("{}", opening_line(self.translator, simulation_id));
    }
}

fn opening_line(translator: &dyn Translator, simulation_id: &str) -> String {
    format!(
        "{} {}",
        translator.t(keys::SIMULATION_OPENING),
        simulation_route(simulation_id)
    )
}

pub fn list_posts<S: KeyValueStore>(store: &PostStore<S>, translator: &dyn Translator) {
    let posts = store.list_posts();
    if posts.is_empty() {
        println!("{}", translator.t(keys::POSTS_EMPTY));
        return;
    }

    for post in &posts {
        println!("{}", render_post_line(post));
    }
}

pub fn add_post<S: KeyValueStore>(
    store: &PostStore<S>,
    args: AddPostArgs,
    translator: &dyn Translator,
) -> Result<BlogPost, CommandError> {
    let image_url = match args.image {
        ImageSource::Url(url) => url,
        ImageSource::File(path) => image_data_uri(&path)?,
    };

    let post = store.add_post(NewPost {
        title: args.title,
        summary: args.summary,
        content: args.content,
        image_url,
    })?;

    println!("{}", translator.t(keys::POSTS_CREATED));
    println!("{}", serde_json::to_string_pretty(&post)?);
    Ok(post)
}

pub async fn ask_once(
    assistant: &AssistantGateway,
    catalog: &dyn SimulationCatalog,
    message: &str,
    translator: &dyn Translator,
) {
    let response = assistant.ask(message, &catalog.summaries()).await;
    println!("{}", render_response(&response, translator));
}

/// Reads questions from stdin until EOF, Ctrl-C or `/quit`. `/open` follows the last
/// recommendation.
pub async fn chat(
    assistant: &AssistantGateway,
    catalog: &dyn SimulationCatalog,
    navigator: &dyn SimulationNavigator,
    translator: &dyn Translator,
) -> Result<(), CommandError> {
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last_recommendation: Option<String> = None;

    println!("{}", translator.t(keys::ASSISTANT_WELCOME));
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = signal::ctrl_c() => {
                println!();
                None
            }
        };
        let Some(line) = line else {
            break;
        };
        let message = line.trim();
        match message {
            "" => continue,
            QUIT_COMMAND => break,
            OPEN_COMMAND => {
                match last_recommendation.as_deref() {
                    Some(simulation_id) => navigator.open_simulation(simulation_id),
                    None => println!("{}", translator.t(keys::SIMULATION_NONE_RECOMMENDED)),
                }
                continue;
            }
            _ => {}
        }

        println!("{}", translator.t(keys::ASSISTANT_THINKING));
        let response = assistant.ask(message, &catalog.summaries()).await;
        if let Some(simulation_id) = response.recommended_simulation() {
            last_recommendation = Some(simulation_id.to_string());
        }
        println!("{}\n", render_response(&response, translator));
    }

    info!(
        turns = assistant.conversation_turns().await.len(),
        "chat session ended"
    );
    Ok(())
}

fn image_data_uri(path: &Path) -> Result<String, CommandError> {
    let bytes = fs::read(path).map_err(|source| CommandError::ReadImage {
        path: path.display().to_string(),
        source,
    })?;
    Ok(format!(
        "data:{};base64,{}",
        mime_for_path(path),
        STANDARD.encode(bytes)
    ))
}

fn mime_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use shared::i18n::Locale;
    use shared::posts::{MemoryKeyValueStore, PostStore};

    use super::{add_post, image_data_uri, mime_for_path, opening_line};
    use crate::cli::{AddPostArgs, ImageSource};

    #[test]
    fn mime_follows_extension_case_insensitively() {
        assert_eq!(mime_for_path(Path::new("cover.PNG")), "image/png");
        assert_eq!(mime_for_path(Path::new("cover.jpeg")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("cover")), "application/octet-stream");
    }

    #[test]
    fn image_file_becomes_data_uri() {
        let path = std::env::temp_dir().join(format!("academy-cli-{}.gif", std::process::id()));
        std::fs::write(&path, b"GIF89a").expect("image should be written");

        let uri = image_data_uri(&path).expect("data uri should build");
        let _ = std::fs::remove_file(&path);

        assert_eq!(uri, "data:image/gif;base64,R0lGODlh");
    }

    #[test]
    fn opening_line_is_translated() {
        assert_eq!(
            opening_line(&Locale::Es, "wallet-setup"),
            "Abriendo simulación: /simulations/wallet-setup"
        );
        assert_eq!(
            opening_line(&Locale::En, "wallet-setup"),
            "Opening simulation: /simulations/wallet-setup"
        );
    }

    #[test]
    fn add_post_uses_remote_url_as_is() {
        let store = PostStore::with_seed(MemoryKeyValueStore::default(), Vec::new());
        let post = add_post(
            &store,
            AddPostArgs {
                title: "Gas Explained".to_string(),
                summary: "What you pay for".to_string(),
                content: "Body".to_string(),
                image: ImageSource::Url("https://example.com/gas.png".to_string()),
            },
            &Locale::En,
        )
        .expect("add should succeed");

        assert_eq!(post.image_url, "https://example.com/gas.png");
        assert_eq!(store.list_posts(), vec![post]);
    }
}
