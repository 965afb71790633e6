use shared::error::{FailureKind, NavFailure};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NavError {
    #[error("transport failure for {url}: {source}")]
    Transport { url: String, source: anyhow::Error },
    #[error("template `{template_id}` failed to render for {url}: {source}")]
    Template {
        template_id: String,
        url: String,
        source: anyhow::Error,
    },
    #[error("navigation controller is already initialized")]
    AlreadyInitialized,
    #[error("no tokio runtime available to drive navigation cycles")]
    NoRuntime,
    #[error("invalid origin url `{url}`: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("failed to build http client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

impl NavError {
    /// Host-facing report for fetch/render failures; `None` for setup errors.
    pub fn failure(&self) -> Option<NavFailure> {
        match self {
            NavError::Transport { url, source } => Some(NavFailure::new(
                FailureKind::Transport,
                url.clone(),
                format!("{source:#}"),
            )),
            NavError::Template {
                template_id,
                url,
                source,
            } => Some(NavFailure::new(
                FailureKind::Template,
                url.clone(),
                format!("template `{template_id}`: {source:#}"),
            )),
            _ => None,
        }
    }
}
