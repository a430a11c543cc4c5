use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser};
use dotenvy::dotenv;
use tracing::info;
use tracing_subscriber::EnvFilter;

use calendar_purge::config::{self, Labels, RunConfiguration, Selectors, Timings};
use calendar_purge::dom::ChromePage;
use calendar_purge::hands::{self, BrowserSession, SessionOptions};
use calendar_purge::preflight::{HostCheck, check_host};
use calendar_purge::{SearchQuery, Sweep, prompt};

#[derive(Parser)]
#[command(
    name = "calendar-purge",
    version,
    about = "Delete every calendar entry whose label contains a given text"
)]
struct Cli {
    /// Text to look for in entry labels. Asked for interactively when omitted.
    #[arg(long, short, env = "CALENDAR_PURGE_QUERY")]
    query: Option<String>,

    /// Number of calendar pages (months) to go through.
    #[arg(long, env = "CALENDAR_PURGE_MAX_PAGES", default_value_t = config::DEFAULT_MAX_PAGES)]
    max_pages: u32,

    /// Leave a page after this many failed deletions in a row.
    #[arg(long, env = "CALENDAR_PURGE_MAX_CONSECUTIVE_FAILURES")]
    max_consecutive_failures: Option<u32>,

    /// Skip the confirmation prompts.
    #[arg(long, short)]
    yes: bool,

    /// Print the final report as JSON.
    #[arg(long)]
    json: bool,

    /// Emit logs as JSON lines.
    #[arg(long, env = "CALENDAR_PURGE_LOG_JSON")]
    log_json: bool,

    #[command(flatten)]
    browser: BrowserArgs,

    #[command(flatten)]
    labels: LabelArgs,

    #[command(flatten)]
    selectors: SelectorArgs,

    #[command(flatten)]
    timings: TimingArgs,
}

#[derive(Args)]
struct BrowserArgs {
    /// DevTools URL of an already running, logged-in Chrome.
    #[arg(long, env = "CALENDAR_PURGE_DEBUG_URL", default_value = hands::DEFAULT_DEBUG_URL)]
    debug_url: String,

    /// Calendar page to open when a new Chrome has to be launched.
    #[arg(long, env = "CALENDAR_PURGE_URL", default_value = hands::DEFAULT_CALENDAR_URL)]
    url: String,

    #[arg(long, env = "CALENDAR_PURGE_CHROME")]
    chrome: Option<PathBuf>,

    /// Chrome profile directory for a launched browser.
    #[arg(long, env = "CALENDAR_PURGE_PROFILE")]
    profile: Option<PathBuf>,

    /// Host the calendar is expected to be served from.
    #[arg(long, env = "CALENDAR_PURGE_HOST", default_value = hands::CALENDAR_HOST)]
    expected_host: String,
}

#[derive(Args)]
struct LabelArgs {
    #[arg(
        long,
        env = "CALENDAR_PURGE_NEXT_PAGE_LABEL",
        default_value = config::DEFAULT_NEXT_PAGE_LABEL
    )]
    next_page_label: String,

    #[arg(
        long,
        env = "CALENDAR_PURGE_DELETE_EVENT_LABEL",
        default_value = config::DEFAULT_DELETE_EVENT_LABEL
    )]
    delete_event_label: String,

    #[arg(
        long,
        env = "CALENDAR_PURGE_DELETE_TASK_LABEL",
        default_value = config::DEFAULT_DELETE_TASK_LABEL
    )]
    delete_task_label: String,

    #[arg(
        long,
        env = "CALENDAR_PURGE_DELETE_RECURRING_EVENT_LABEL",
        default_value = config::DEFAULT_DELETE_RECURRING_EVENT_LABEL
    )]
    delete_recurring_event_label: String,

    #[arg(
        long,
        env = "CALENDAR_PURGE_DELETE_RECURRING_TASK_LABEL",
        default_value = config::DEFAULT_DELETE_RECURRING_TASK_LABEL
    )]
    delete_recurring_task_label: String,
}

#[derive(Args)]
struct SelectorArgs {
    #[arg(long, env = "CALENDAR_PURGE_ENTRY_TAG", default_value = config::DEFAULT_ENTRY_TAG)]
    entry_tag: String,

    #[arg(
        long,
        env = "CALENDAR_PURGE_RECURRING_DIALOG",
        default_value = config::DEFAULT_RECURRING_DIALOG_SELECTOR
    )]
    recurring_dialog: String,

    #[arg(
        long,
        env = "CALENDAR_PURGE_RECURRING_OK",
        default_value = config::DEFAULT_RECURRING_OK_SELECTOR
    )]
    recurring_ok: String,

    /// Loading indicator; settle waits end early once it disappears.
    #[arg(long, env = "CALENDAR_PURGE_BUSY_INDICATOR")]
    busy_indicator: Option<String>,
}

#[derive(Args)]
struct TimingArgs {
    #[arg(long, env = "CALENDAR_PURGE_POLL_MS", default_value_t = 100)]
    poll_ms: u64,

    #[arg(long, env = "CALENDAR_PURGE_DELETE_TIMEOUT_MS", default_value_t = 3000)]
    delete_timeout_ms: u64,

    #[arg(long, env = "CALENDAR_PURGE_DIALOG_SETTLE_MS", default_value_t = 500)]
    dialog_settle_ms: u64,

    #[arg(long, env = "CALENDAR_PURGE_DIALOG_OK_TIMEOUT_MS", default_value_t = 2000)]
    dialog_ok_timeout_ms: u64,

    #[arg(long, env = "CALENDAR_PURGE_NEXT_TIMEOUT_MS", default_value_t = 3000)]
    next_timeout_ms: u64,

    #[arg(long, env = "CALENDAR_PURGE_PAGE_SETTLE_MS", default_value_t = 2000)]
    page_settle_ms: u64,

    #[arg(long, env = "CALENDAR_PURGE_AFTER_DELETE_MS", default_value_t = 800)]
    after_delete_ms: u64,

    #[arg(long, env = "CALENDAR_PURGE_AFTER_FAILURE_MS", default_value_t = 1500)]
    after_failure_ms: u64,

    #[arg(long, env = "CALENDAR_PURGE_AFTER_PAGINATION_MS", default_value_t = 2000)]
    after_pagination_ms: u64,

    #[arg(long, env = "CALENDAR_PURGE_AFTER_RECOVERY_MS", default_value_t = 3000)]
    after_recovery_ms: u64,
}

impl Cli {
    fn run_configuration(&self) -> RunConfiguration {
        let t = &self.timings;
        RunConfiguration {
            labels: Labels {
                next_page: self.labels.next_page_label.clone(),
                delete_event: self.labels.delete_event_label.clone(),
                delete_task: self.labels.delete_task_label.clone(),
                delete_recurring_event: self.labels.delete_recurring_event_label.clone(),
                delete_recurring_task: self.labels.delete_recurring_task_label.clone(),
            },
            selectors: Selectors {
                entry_tag: self.selectors.entry_tag.clone(),
                recurring_dialog: self.selectors.recurring_dialog.clone(),
                recurring_ok: self.selectors.recurring_ok.clone(),
                busy_indicator: self.selectors.busy_indicator.clone(),
            },
            timings: Timings {
                poll_interval: Duration::from_millis(t.poll_ms),
                delete_control_timeout: Duration::from_millis(t.delete_timeout_ms),
                dialog_settle: Duration::from_millis(t.dialog_settle_ms),
                dialog_ok_timeout: Duration::from_millis(t.dialog_ok_timeout_ms),
                next_control_timeout: Duration::from_millis(t.next_timeout_ms),
                page_settle: Duration::from_millis(t.page_settle_ms),
                after_delete: Duration::from_millis(t.after_delete_ms),
                after_failure: Duration::from_millis(t.after_failure_ms),
                after_pagination: Duration::from_millis(t.after_pagination_ms),
                after_recovery: Duration::from_millis(t.after_recovery_ms),
            },
            max_pages: self.max_pages,
            max_consecutive_failures: self.max_consecutive_failures,
        }
    }

    fn session_options(&self) -> SessionOptions {
        SessionOptions {
            debug_url: self.browser.debug_url.clone(),
            calendar_url: self.browser.url.clone(),
            chrome_path: self.browser.chrome.clone(),
            profile_dir: self.browser.profile.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.log_json)?;

    info!("Calendar deletion tool started");

    let config = cli.run_configuration();
    config.validate()?;

    // 1. What to delete.
    let raw_query = match &cli.query {
        Some(q) => Some(q.clone()),
        None => prompt::ask(
            "Enter the text to search for in calendar events that you want to delete",
        )?,
    };
    let Some(raw_query) = raw_query else {
        info!("Operation cancelled by user during input phase");
        return Ok(ExitCode::SUCCESS);
    };
    let query = SearchQuery::new(&raw_query)?;
    info!(search = %query, length = query.as_str().len(), "Search text collected");

    // 2. Browser (blocking; can take a while).
    let options = cli.session_options();
    let session = tokio::task::spawn_blocking(move || BrowserSession::launch(&options))
        .await
        .context("browser launch panicked")??;
    let page = ChromePage::new(Arc::clone(&session.tab));

    // 3. Make sure we're on the calendar and the user really means it.
    if let HostCheck::Unsupported { host } = check_host(&page, &cli.browser.expected_host).await? {
        let question = format!(
            "This tool is designed for {}, but the tab is on \"{host}\". Continue anyway?",
            cli.browser.expected_host
        );
        if !cli.yes && !prompt::confirm(&question)? {
            info!("User chose not to continue on non-calendar page");
            return Ok(ExitCode::SUCCESS);
        }
    }

    if !cli.yes {
        eprintln!("{}", prompt::destructive_warning(query.as_str(), config.max_pages));
        if !prompt::confirm("Proceed")? {
            info!("User declined confirmation");
            return Ok(ExitCode::SUCCESS);
        }
    }
    info!(status = "success", search = %query, "User input validated and confirmed");

    // 4. Go.
    let report = Sweep::new(&page, &config, &query).run().await;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.notification());
    }

    Ok(if report.is_aborted() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn init_tracing(json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("calendar_purge=info"))?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}
