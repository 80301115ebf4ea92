use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ListPosts,
    AddPost(AddPostArgs),
    Ask { message: String },
    Chat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddPostArgs {
    pub title: String,
    pub summary: String,
    pub content: String,
    pub image: ImageSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Url(String),
    File(PathBuf),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    #[error("unknown argument: {0}")]
    UnknownArgument(String),
    #[error("missing value for argument: {0}")]
    MissingValue(String),
    #[error("missing command")]
    MissingCommand,
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
    #[error("exactly one of --image-url or --image-file is required")]
    ImageSourceRequired,
    #[error("ask needs a message")]
    EmptyMessage,
    #[error("help requested")]
    HelpRequested,
}

impl Command {
    pub fn parse<I>(args: I) -> Result<Self, CliError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut iter = args.into_iter();
        let first = iter.next().ok_or(CliError::MissingCommand)?;

        match first.as_str() {
            "--help" | "-h" | "help" => Err(CliError::HelpRequested),
            "posts" => {
                let sub = iter.next().ok_or(CliError::MissingCommand)?;
                match sub.as_str() {
                    "list" => {
                        reject_extra(iter)?;
                        Ok(Self::ListPosts)
                    }
                    "add" => parse_add_post(iter).map(Self::AddPost),
                    "--help" | "-h" => Err(CliError::HelpRequested),
                    unknown => Err(CliError::UnknownArgument(unknown.to_string())),
                }
            }
            "ask" => {
                let message = iter.collect::<Vec<_>>().join(" ");
                if message.trim().is_empty() {
                    return Err(CliError::EmptyMessage);
                }
                Ok(Self::Ask { message })
            }
            "chat" => {
                reject_extra(iter)?;
                Ok(Self::Chat)
            }
            unknown => Err(CliError::UnknownArgument(unknown.to_string())),
        }
    }
}

fn parse_add_post<I>(mut iter: I) -> Result<AddPostArgs, CliError>
where
    I: Iterator<Item = String>,
{
    let mut title = None;
    let mut summary = None;
    let mut content = None;
    let mut image_url = None;
    let mut image_file = None;

    while let Some(arg) = iter.next() {
        let slot = match arg.as_str() {
            "--help" | "-h" => return Err(CliError::HelpRequested),
            "--title" => &mut title,
            "--summary" => &mut summary,
            "--content" => &mut content,
            "--image-url" => &mut image_url,
            "--image-file" => &mut image_file,
            unknown => return Err(CliError::UnknownArgument(unknown.to_string())),
        };
        let value = iter.next().ok_or(CliError::MissingValue(arg.clone()))?;
        *slot = Some(value);
    }

    let image = match (image_url, image_file) {
        (Some(url), None) => ImageSource::Url(require_non_empty("--image-url", Some(url))?),
        (None, Some(path)) => {
            ImageSource::File(PathBuf::from(require_non_empty("--image-file", Some(path))?))
        }
        _ => return Err(CliError::ImageSourceRequired),
    };

    Ok(AddPostArgs {
        title: require_non_empty("--title", title)?,
        summary: require_non_empty("--summary", summary)?,
        content: require_non_empty("--content", content)?,
        image,
    })
}

fn require_non_empty(name: &'static str, value: Option<String>) -> Result<String, CliError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(CliError::EmptyField(name)),
    }
}

fn reject_extra<I>(mut iter: I) -> Result<(), CliError>
where
    I: Iterator<Item = String>,
{
    match iter.next() {
        Some(extra) => Err(CliError::UnknownArgument(extra)),
        None => Ok(()),
    }
}
