use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use sitebuilder::backend::{BackendError, RecordStore, RestBackend};
use sitebuilder::config::{BuilderConfig, ConfigError};
use sitebuilder::interaction::ActionKind;
use sitebuilder::notice::{ErrorCode, Notice};
use sitebuilder::services::action::{ActionExecutor, ActionOutcome, HeadlessNavigator};
use sitebuilder::services::deploy::{DeployClient, DeployError, DeployMethod};
use sitebuilder::services::element::{self, ElementError};
use sitebuilder::services::history::{self, HistoryError};
use sitebuilder::session::{Session, SessionHandle};
use sitebuilder::state::BuilderState;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Element(#[from] ElementError),
    #[error(transparent)]
    History(#[from] HistoryError),
    #[error(transparent)]
    Deploy(#[from] DeployError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl ErrorCode for CliError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.error_code(),
            Self::Backend(e) => e.error_code(),
            Self::Element(e) => e.error_code(),
            Self::History(e) => e.error_code(),
            Self::Deploy(e) => e.error_code(),
            Self::InvalidJson(_) => "E_INVALID_JSON",
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Backend(e) => e.retryable(),
            Self::Element(e) => e.retryable(),
            Self::History(e) => e.retryable(),
            Self::Deploy(e) => e.retryable(),
            Self::Config(_) | Self::InvalidJson(_) => false,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "sitebuilder", about = "Website builder state engine CLI")]
struct Cli {
    #[arg(long, env = "PROJECT_ID")]
    project: Option<Uuid>,

    /// Signed-in user; combined with SERVICE_ACCESS_TOKEN to open a session.
    #[arg(long, env = "SERVICE_USER_ID")]
    user: Option<Uuid>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List a page's history snapshots.
    History {
        #[arg(long)]
        page: Uuid,
    },
    /// Print a page's elements.
    Elements {
        #[arg(long)]
        page: Uuid,
    },
    /// Run an element's click action headlessly.
    Click {
        #[arg(long)]
        page: Uuid,
        #[arg(long)]
        element: String,
        #[arg(long, value_parser = parse_action)]
        action: ActionKind,
    },
    /// Invoke the deployment function.
    Deploy {
        #[arg(value_parser = parse_method)]
        method: DeployMethod,
        #[arg(long)]
        data: Option<String>,
    },
}

fn parse_action(raw: &str) -> Result<ActionKind, String> {
    match ActionKind::parse(raw) {
        ActionKind::None if raw != "none" => Err(format!("unknown action `{raw}`")),
        kind => Ok(kind),
    }
}

fn parse_method(raw: &str) -> Result<DeployMethod, String> {
    raw.parse().map_err(|e: DeployError| e.to_string())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let notice = Notice::from_error(&err);
            eprintln!("{}", serde_json::to_string(&notice).unwrap_or_else(|_| notice.message.clone()));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = BuilderConfig::from_env()?;
    let session = SessionHandle::signed_out();
    if let (Some(user_id), Some(access_token)) = (cli.user, config.access_token.clone()) {
        session.sign_in(Session { user_id, access_token });
    }
    let backend: Arc<dyn RecordStore> = Arc::new(RestBackend::new(&config, session.clone())?);
    let project_id = cli.project.unwrap_or(Uuid::nil());
    let page_state = |page_id| {
        BuilderState::new(project_id, page_id, Arc::clone(&backend), session.clone(), config.clone())
    };

    match cli.command {
        Command::History { page } => {
            let snapshots = history::fetch_snapshots(backend.as_ref(), page).await?;
            let rows: Vec<Value> = snapshots.iter().map(history::describe).collect();
            print_json(&rows)
        }
        Command::Elements { page } => {
            let state = page_state(page);
            element::load_elements(&state).await?;
            print_json(&element::elements(&state).await)
        }
        Command::Click { page, element, action } => {
            let state = page_state(page);
            element::load_elements(&state).await?;
            let executor = ActionExecutor::new(state.clone(), Arc::new(HeadlessNavigator));
            let outcome = executor.execute(&element, action).await;
            if matches!(outcome, ActionOutcome::Chained { .. }) {
                // Steps run on their own timers; stay alive until the last nested one fires.
                let last = executor.chain_span(&element).await;
                tokio::time::sleep(last + Duration::from_millis(50)).await;
            }
            print_json(&outcome)
        }
        Command::Deploy { method, data } => {
            let data = match data {
                Some(raw) => serde_json::from_str(&raw)?,
                None => Value::Object(serde_json::Map::new()),
            };
            let client = DeployClient::new(Arc::clone(&backend), config.deploy_function.clone());
            print_json(&client.call(method, data).await?)
        }
    }
}

fn print_json(value: &impl Serialize) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
