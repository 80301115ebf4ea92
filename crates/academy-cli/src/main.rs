mod cli;
mod commands;
mod render;

use std::sync::Arc;

use cli::{CliError, Command};
use shared::config::{SiteConfig, load_dotenv};
use shared::llm::{AssistantGateway, GeminiConnector};
use shared::posts::{FileKeyValueStore, PostStore};
use shared::simulations::BuiltinSimulations;
use tracing::error;

#[tokio::main]
async fn main() {
    load_dotenv();
    init_tracing();

    let command = match Command::parse(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(CliError::HelpRequested) => {
            print_usage();
            std::process::exit(0);
        }
        Err(err) => {
            eprintln!("error: {err}");
            eprintln!();
            print_usage();
            std::process::exit(2);
        }
    };

    let config = match SiteConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "failed to load site config");
            std::process::exit(2);
        }
    };

    if let Err(err) = run(command, config).await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

async fn run(command: Command, config: SiteConfig) -> Result<(), commands::CommandError> {
    let locale = config.locale;
    match command {
        Command::ListPosts => {
            let store = PostStore::new(FileKeyValueStore::new(&config.data_dir));
            commands::list_posts(&store, &locale);
        }
        Command::AddPost(args) => {
            let store = PostStore::new(FileKeyValueStore::new(&config.data_dir));
            commands::add_post(&store, args, &locale)?;
        }
        Command::Ask { message } => {
            let assistant = assistant_gateway(&config);
            commands::ask_once(&assistant, &BuiltinSimulations, &message, &locale).await;
        }
        Command::Chat => {
            let assistant = assistant_gateway(&config);
            commands::chat(
                &assistant,
                &BuiltinSimulations,
                &commands::TerminalNavigator::new(&locale),
                &locale,
            )
            .await?;
        }
    }
    Ok(())
}

fn assistant_gateway(config: &SiteConfig) -> AssistantGateway {
    AssistantGateway::new(
        Arc::new(GeminiConnector::from_env()),
        Arc::new(config.locale),
    )
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "academy_cli=info,shared=info".to_string());
    let json = std::env::var("ACADEMY_LOG_FORMAT")
        .map(|format| format.trim().eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().flatten_event(true).init();
    } else {
        builder.init();
    }
}

fn print_usage() {
    eprintln!(
        "Usage: academy-cli <command> [options]\n\
         \n\
         Commands:\n\
         - posts list                     List blog posts, newest first\n\
         - posts add --title <t> --summary <s> --content <c>\n\
         \x20          (--image-url <url> | --image-file <path>)\n\
         \x20                                Publish a new blog post\n\
         - ask <message...>               Ask the assistant one question\n\
         - chat                           Interactive assistant session (/open, /quit)\n\
         \n\
         Options:\n\
         - --help                         Show this help text"
    );
}
