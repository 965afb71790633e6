mod config;
mod menu_file;
mod templates;

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::{bail, Context, Result};
use clap::Parser;
use nav_core::{
    Dom, HistoryFacade, HttpTransport, MemoryDom, MemoryHistory, NavController, NavDependencies,
};
use shared::protocol::{ContentPayload, NavEvent, NavOptions};
use tokio::sync::broadcast;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::menu_file::{MenuFile, MountedMenu};

/// Drive a soft-navigation menu against a content origin and print the page
/// after each step.
#[derive(Parser, Debug)]
struct Args {
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    origin: Option<String>,
    #[arg(long)]
    menu: Option<PathBuf>,
    #[arg(long)]
    start: Option<String>,
    #[arg(long)]
    timeout_ms: Option<u64>,
    /// JSON file holding `{ "content": ... }` embedded in the start page.
    #[arg(long)]
    initial_model: Option<PathBuf>,
    /// `click:<href>`, `go:<url>`, `back` or `forward`.
    #[arg(value_parser = parse_step)]
    steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    Click(String),
    Go(String),
    Back,
    Forward,
}

fn parse_step(raw: &str) -> Result<Step, String> {
    match raw {
        "back" => Ok(Step::Back),
        "forward" => Ok(Step::Forward),
        _ => match raw.split_once(':') {
            Some(("click", href)) if !href.is_empty() => Ok(Step::Click(href.to_string())),
            Some(("go", url)) if !url.is_empty() => Ok(Step::Go(url.to_string())),
            _ => Err(format!(
                "unknown step `{raw}`; expected click:<href>, go:<url>, back or forward"
            )),
        },
    }
}

struct Shell {
    dom: Arc<MemoryDom>,
    history: Arc<MemoryHistory>,
    menu: MountedMenu,
    controller: Arc<NavController>,
    events: broadcast::Receiver<NavEvent>,
    wait: Duration,
}

impl Shell {
    async fn run_step(&mut self, step: &Step) -> Result<()> {
        let before = self.controller.sequence();
        match step {
            Step::Click(href) => {
                let Some(link) = self.menu.link(href) else {
                    bail!("no menu link with href `{href}`");
                };
                if !self.dom.click(link) {
                    println!("{href} is not a managed link; the browser would load it");
                }
            }
            Step::Go(url) => self.history.push_location(None, url),
            Step::Back => {
                if !self.history.go_back() {
                    println!("already at the oldest history entry");
                }
            }
            Step::Forward => {
                if !self.history.go_forward() {
                    println!("already at the newest history entry");
                }
            }
        }

        if self.controller.sequence() == before {
            println!("(no navigation)");
            return Ok(());
        }

        let event = tokio::time::timeout(self.wait, self.events.recv())
            .await
            .context("timed out waiting for navigation to settle")??;
        match event {
            NavEvent::Synced { .. } | NavEvent::InitialRendered { .. } => self.print_page(),
            NavEvent::ExternalNavigation { url } => println!("full page load: {url}"),
            NavEvent::Discarded { url, .. } => println!("superseded navigation to {url}"),
            NavEvent::CycleFailed { failure, .. } => {
                println!(
                    "navigation to {} failed ({:?}): {}",
                    failure.url, failure.kind, failure.message
                );
            }
        }
        Ok(())
    }

    fn print_page(&self) {
        let active = self
            .controller
            .active_entry()
            .map(|entry| entry.href)
            .unwrap_or_else(|| "-".to_string());
        println!(
            "[{}] title={:?} active={}",
            self.history.current_location(),
            self.dom.title(),
            active
        );
        println!("{}", self.dom.content(self.menu.content));
    }
}

fn read_initial_model(path: &Path) -> Result<ContentPayload> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read initial model '{}'", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("invalid initial model '{}'", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let mut settings = config::load_settings(args.config.as_deref())?;
    if let Some(origin) = &args.origin {
        settings.origin = origin.clone();
    }
    if let Some(menu) = &args.menu {
        settings.menu_path = menu.clone();
    }
    if let Some(start) = &args.start {
        settings.start = start.clone();
    }
    if let Some(timeout_ms) = args.timeout_ms {
        settings.timeout_ms = timeout_ms;
    }

    let menu_file = MenuFile::load(&settings.menu_path)?;
    let dom = Arc::new(MemoryDom::new());
    let menu = menu_file.mount(&dom);
    let history = Arc::new(MemoryHistory::new(settings.start.clone()));
    let transport = Arc::new(HttpTransport::new(&settings.origin, settings.timeout())?);
    let options = match &args.initial_model {
        Some(path) => NavOptions::with_initial_model(read_initial_model(path)?),
        None => NavOptions::default(),
    };

    let controller = NavController::new(
        NavDependencies {
            dom: dom.clone(),
            history: history.clone(),
            renderer: Arc::new(menu_file.renderer()?),
            transport,
        },
        menu.nav,
        menu.content,
        options,
    );
    for skipped in controller.skipped_entries() {
        let href = dom.attr(skipped.link, "href").unwrap_or_default();
        warn!(%href, missing = ?skipped.missing, "menu item excluded");
    }
    controller.initialize()?;

    let events = controller.subscribe_events();
    let mut shell = Shell {
        dom,
        history,
        menu,
        controller,
        events,
        wait: settings.timeout() + Duration::from_secs(1),
    };
    shell.print_page();
    for step in &args.steps {
        println!("> {step:?}");
        shell.run_step(step).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_steps() {
        assert_eq!(parse_step("back"), Ok(Step::Back));
        assert_eq!(parse_step("forward"), Ok(Step::Forward));
        assert_eq!(parse_step("click:/about"), Ok(Step::Click("/about".into())));
        assert_eq!(
            parse_step("go:/a:b?x=1"),
            Ok(Step::Go("/a:b?x=1".into()))
        );
        assert!(parse_step("click:").is_err());
        assert!(parse_step("jump").is_err());
    }

    #[test]
    fn args_accept_steps_after_flags() {
        let args = Args::try_parse_from([
            "navshell",
            "--origin",
            "http://site.test",
            "click:/about",
            "back",
        ])
        .expect("parse args");
        assert_eq!(args.origin.as_deref(), Some("http://site.test"));
        assert_eq!(args.steps, vec![Step::Click("/about".into()), Step::Back]);
    }
}
