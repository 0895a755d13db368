//! CLI helper functions

use crate::{
    client::{DEFAULT_GITHUB_URL, DEFAULT_MANAGEMENT_URL, GitHubClient, ManagementClient, Revision},
    error::Error,
    flow::{FlowOutcome, Orchestrator, Session},
    page::{PageContext, SessionStorage},
    presenter::{IconState, NoticeKind, Presenter, Prompter, StatusKind},
    storage::{LocalFiles, RemoteStoreConfig, SessionStore},
};
use eyre::{Context, Result};
use owo_colors::OwoColorize;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use url::Url;

/// Build the inspected page from a tab URL and an optional session storage dump
pub fn load_page_context(url: &str, storage: Option<&Path>) -> Result<PageContext> {
    match storage {
        Some(dump) => PageContext::from_dump(url, dump)
            .with_context(|| format!("Failed to read session storage from {}", dump.display())),
        None => {
            log::debug!("No session storage dump given");
            Ok(PageContext::new(url, SessionStorage::new()))
        }
    }
}

/// Management API base URL from `AZURE_MANAGEMENT_URL`, defaulting to public Azure
pub fn management_url() -> Result<Url> {
    let url = std::env::var("AZURE_MANAGEMENT_URL")
        .unwrap_or_else(|_| DEFAULT_MANAGEMENT_URL.to_string());
    Url::parse(&url).with_context(|| format!("Invalid AZURE_MANAGEMENT_URL: {}", url))
}

/// GitHub API base URL from `GITHUB_API_URL`, defaulting to github.com
pub fn github_url() -> Result<Url> {
    let url = std::env::var("GITHUB_API_URL").unwrap_or_else(|_| DEFAULT_GITHUB_URL.to_string());
    Url::parse(&url).with_context(|| format!("Invalid GITHUB_API_URL: {}", url))
}

/// GitHub settings saved this session, falling back to `GITHUB_TOKEN`/`GITHUB_REPO`
pub fn load_store_config(store: &SessionStore) -> Result<Option<RemoteStoreConfig>> {
    if let Some(config) = store
        .load()
        .with_context(|| format!("Failed to read {}", store.path().display()))?
    {
        log::debug!("Using GitHub settings from {}", store.path().display());
        return Ok(Some(config));
    }
    let config = RemoteStoreConfig::from_env().context("Invalid GITHUB_REPO")?;
    if config.is_some() {
        log::debug!("Using GitHub settings from the environment");
    }
    Ok(config)
}

/// GitHub client for the loaded settings, if there are any
pub fn load_github_client(store: &SessionStore) -> Result<Option<GitHubClient>> {
    match load_store_config(store)? {
        Some(config) => Ok(Some(
            GitHubClient::try_new(github_url()?, &config)
                .context("Failed to create GitHub client")?,
        )),
        None => Ok(None),
    }
}

/// Terminal front end: status and notifications on the console, prompts on stdin
#[derive(Debug, Default)]
pub struct Terminal {
    message: Option<String>,
    revision: Option<String>,
}

impl Terminal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer the commit message prompt with `message` instead of asking
    pub fn with_message(mut self, message: Option<String>) -> Self {
        self.message = message;
        self
    }

    /// Answer the revision picker with the revision whose id starts with `revision`
    pub fn with_revision(mut self, revision: Option<String>) -> Self {
        self.revision = revision;
        self
    }
}

/// Read one line from stdin; `None` on end of input
async fn read_line(prompt: String) -> crate::error::Result<Option<String>> {
    let line = tokio::task::spawn_blocking(move || -> std::io::Result<Option<String>> {
        let mut stderr = std::io::stderr();
        write!(stderr, "{}", prompt)?;
        stderr.flush()?;
        let mut line = String::new();
        match std::io::stdin().lock().read_line(&mut line)? {
            0 => Ok(None),
            _ => Ok(Some(line.trim_end_matches(['\r', '\n']).to_string())),
        }
    })
    .await
    .map_err(std::io::Error::other)??;
    Ok(line)
}

/// Pick a revision by (abbreviated) id
fn find_revision(revisions: &[Revision], id: &str) -> Option<usize> {
    revisions.iter().position(|r| r.id.starts_with(id))
}

/// Parse a 1-based menu choice
fn parse_choice(answer: &str, count: usize) -> Option<usize> {
    answer
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|n| (1..=count).contains(n))
        .map(|n| n - 1)
}

fn format_revision(index: usize, revision: &Revision) -> String {
    let when = revision
        .timestamp
        .map(|t| t.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "unknown date".to_string());
    format!(
        "{:>3}) {} {} {} {}",
        index + 1,
        revision.short_id().yellow(),
        when,
        revision.author.cyan(),
        revision.summary()
    )
}

impl Presenter for Terminal {
    fn status(&self, kind: StatusKind, message: &str) {
        match kind {
            StatusKind::Ready => log::info!("{}", message.green()),
            StatusKind::Busy => log::info!("{}", message.bright_black()),
            StatusKind::Error => log::error!("{}", message.red()),
        }
    }

    fn notify(&self, kind: NoticeKind, message: &str) {
        match kind {
            NoticeKind::Success => println!("{} {}", "✓".green(), message),
            NoticeKind::Info => println!("{} {}", "i".cyan(), message),
            NoticeKind::Error => eprintln!("{} {}", "✗".red(), message),
        }
    }
}

impl Prompter for Terminal {
    async fn commit_message(&self, default: &str) -> crate::error::Result<Option<String>> {
        if let Some(message) = &self.message {
            return Ok(Some(message.clone()));
        }
        read_line(format!(
            "Commit message [{}] (Ctrl-D to cancel): ",
            default.bright_black()
        ))
        .await
    }

    async fn pick_revision(&self, revisions: &[Revision]) -> crate::error::Result<Option<usize>> {
        if let Some(id) = &self.revision {
            return find_revision(revisions, id)
                .map(Some)
                .ok_or_else(|| Error::UnknownRevision(id.clone()));
        }

        let menu: Vec<String> = revisions
            .iter()
            .enumerate()
            .map(|(i, r)| format_revision(i, r))
            .collect();
        eprintln!("{}", menu.join("\n"));

        loop {
            let prompt = format!("Restore which backup? [1-{}, empty to cancel]: ", revisions.len());
            let Some(answer) = read_line(prompt).await? else {
                return Ok(None);
            };
            if answer.trim().is_empty() || answer.trim().eq_ignore_ascii_case("q") {
                return Ok(None);
            }
            match parse_choice(&answer, revisions.len()) {
                Some(index) => return Ok(Some(index)),
                None => eprintln!("{} is not a listed backup", answer.trim().yellow()),
            }
        }
    }
}

/// Report a precondition failure the way a failed flow would be reported
fn report_precondition(ui: &Terminal, error: Error) -> FlowOutcome {
    ui.status(StatusKind::Error, &error.to_string());
    if matches!(error, Error::MissingToken) {
        ui.notify(
            NoticeKind::Error,
            "Could not find auth token. Try refreshing the page.",
        );
    }
    FlowOutcome::Failed(error)
}

/// Print what the popup would show for a page
pub fn inspect(page: &PageContext) -> Result<()> {
    let icon = IconState::for_url(page.url());
    println!("Icon:           {}", icon.to_string().cyan());
    println!("Azure Portal:   {}", page.is_portal());

    match page.workflow_ref() {
        Some(workflow) => {
            println!("Logic App:      {}", workflow.workflow_name.cyan());
            println!("Resource group: {}", workflow.resource_group.cyan());
            println!("Subscription:   {}", workflow.subscription_id.bright_black());
        }
        None => println!("Logic App:      {}", "not a Logic App page".yellow()),
    }

    let token = match page.session_token() {
        Some(_) => "found".green().to_string(),
        None => "missing".red().to_string(),
    };
    println!("Auth token:     {}", token);

    match Session::initialize(page) {
        Ok(_) => println!("{} Ready to backup/restore", "✓".green()),
        Err(e) => println!("{} {}", "✗".red(), e),
    }
    Ok(())
}

/// Options for the backup command
#[derive(Debug, Clone, Default)]
pub struct BackupOptions {
    pub to_store: bool,
    pub output_dir: PathBuf,
    pub message: Option<String>,
}

/// Back up the page's workflow to a file or to GitHub
pub async fn backup(
    page: &PageContext,
    options: BackupOptions,
    store: &SessionStore,
) -> Result<FlowOutcome> {
    let ui = Terminal::new().with_message(options.message);
    let session = match Session::initialize(page) {
        Ok(session) => session,
        Err(e) => return Ok(report_precondition(&ui, e)),
    };

    let api = ManagementClient::try_new(management_url()?, session.token())
        .context("Failed to create management API client")?;
    let files = LocalFiles::new(&options.output_dir);
    let orchestrator = Orchestrator::new(session, api, files, ui);

    if options.to_store {
        let github = load_github_client(store)?;
        Ok(orchestrator.backup_to_store(github.as_ref()).await)
    } else {
        Ok(orchestrator.backup_to_file().await)
    }
}

/// Options for the restore command
#[derive(Debug, Clone, Default)]
pub struct RestoreOptions {
    pub file: Option<PathBuf>,
    pub from_store: bool,
    pub revision: Option<String>,
    pub limit: usize,
}

/// Restore the page's workflow from a file or from GitHub
pub async fn restore(
    page: &PageContext,
    options: RestoreOptions,
    store: &SessionStore,
) -> Result<FlowOutcome> {
    let ui = Terminal::new().with_revision(options.revision);
    let session = match Session::initialize(page) {
        Ok(session) => session,
        Err(e) => return Ok(report_precondition(&ui, e)),
    };

    let api = ManagementClient::try_new(management_url()?, session.token())
        .context("Failed to create management API client")?;
    let files = LocalFiles::new(".").with_selected(options.file);
    let orchestrator =
        Orchestrator::new(session, api, files, ui).with_revision_limit(options.limit);

    if options.from_store {
        let github = load_github_client(store)?;
        Ok(orchestrator.restore_from_store(github.as_ref()).await)
    } else {
        Ok(orchestrator.restore_from_file().await)
    }
}

/// Validate, test and then save GitHub settings for this session
pub async fn config_set(store: &SessionStore, token: &str, repository: &str) -> Result<()> {
    let config = RemoteStoreConfig::new(token, repository)?;

    log::info!("Testing connection...");
    let client = GitHubClient::try_new(github_url()?, &config)?;
    let info = client.test_connection().await?;

    store
        .save(&config)
        .with_context(|| format!("Failed to save settings to {}", store.path().display()))?;
    println!(
        "{} Settings saved successfully! Repository: {}",
        "✓".green(),
        info.full_name.cyan()
    );
    Ok(())
}

/// Check the saved GitHub settings against the API
pub async fn config_test(store: &SessionStore) -> Result<()> {
    let client = load_github_client(store)?.ok_or(Error::StoreNotConfigured)?;
    log::info!("Testing connection...");
    let info = client.test_connection().await?;
    println!(
        "{} Connection successful! Repository: {} ({})",
        "✓".green(),
        info.full_name.cyan(),
        match info.private {
            true => "Private",
            false => "Public",
        }
    );
    Ok(())
}

/// Show which repository is configured, never the token
pub fn config_show(store: &SessionStore) -> Result<()> {
    match load_store_config(store)? {
        Some(config) => println!("Repository: {}", config.repository().to_string().cyan()),
        None => println!("{}", "GitHub is not configured".yellow()),
    }
    println!("Session file: {}", store.path().display().bright_black());
    Ok(())
}

pub fn config_clear(store: &SessionStore) -> Result<()> {
    match store.clear()? {
        true => println!("{} Settings cleared", "✓".green()),
        false => println!("Nothing to clear"),
    }
    Ok(())
}
