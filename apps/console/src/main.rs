use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use dashboard_core::{
    load_settings, query::PAGE_SIZE_OPTIONS, DashboardClient, FetchOutcome, ListController,
    ListEvent, QueryAction, QueryState,
};
use shared::{
    domain::{ActivityId, ClientId},
    forms::{ActivityForm, UserForm},
};
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

mod render;

use render::{render_table, TableRow};

#[derive(Parser, Debug)]
#[command(about = "Manage marketing activities and clients")]
struct Cli {
    /// Settings file; defaults to ./dashboard.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    api_url: Option<String>,
    #[command(subcommand)]
    resource: Resource,
}

#[derive(Subcommand, Debug)]
enum Resource {
    Activities {
        #[command(subcommand)]
        command: ActivityCommand,
    },
    Clients {
        #[command(subcommand)]
        command: ClientCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ActivityCommand {
    List(ListArgs),
    Create(ActivityArgs),
    Update {
        id: String,
        #[command(flatten)]
        form: ActivityArgs,
    },
    Delete {
        id: String,
    },
}

#[derive(Subcommand, Debug)]
enum ClientCommand {
    List(ListArgs),
    Create(UserArgs),
    Update {
        id: String,
        #[command(flatten)]
        form: UserArgs,
    },
    Delete {
        id: String,
    },
}

#[derive(Args, Debug)]
struct ListArgs {
    /// 1-based page number.
    #[arg(long, default_value_t = 1)]
    page: u32,
    #[arg(long, value_parser = parse_page_size)]
    page_size: Option<u32>,
    #[arg(long)]
    search: Option<String>,
    /// Column to sort by; repeat to flip the direction like a header click.
    #[arg(long)]
    sort: Vec<String>,
}

#[derive(Args, Debug)]
struct ActivityArgs {
    #[arg(long)]
    date: String,
    #[arg(long)]
    time: String,
    #[arg(long)]
    receiver: String,
    #[arg(long)]
    brief: String,
    #[arg(long)]
    status: Option<String>,
}

impl From<ActivityArgs> for ActivityForm {
    fn from(args: ActivityArgs) -> Self {
        Self {
            date: args.date,
            time: args.time,
            receiver: args.receiver,
            brief: args.brief,
            status: args.status,
        }
    }
}

#[derive(Args, Debug)]
struct UserArgs {
    #[arg(long)]
    name: String,
    #[arg(long = "type")]
    kind: String,
}

impl From<UserArgs> for UserForm {
    fn from(args: UserArgs) -> Self {
        Self {
            name: args.name,
            kind: args.kind,
        }
    }
}

fn parse_page_size(raw: &str) -> Result<u32, String> {
    let size: u32 = raw.parse().map_err(|_| format!("'{raw}' is not a number"))?;
    if PAGE_SIZE_OPTIONS.contains(&size) {
        Ok(size)
    } else {
        Err(format!("page size must be one of {PAGE_SIZE_OPTIONS:?}"))
    }
}

fn build_query(args: &ListArgs, default_page_size: u32) -> QueryState {
    let mut query = QueryState::with_page_size(args.page_size.unwrap_or(default_page_size));
    for field in &args.sort {
        query = query.reduce(QueryAction::ToggleSort(field.clone()));
    }
    if let Some(search) = &args.search {
        query = query.reduce(QueryAction::SetSearchText(search.clone()));
    }
    query.reduce(QueryAction::SetPageIndex(args.page.saturating_sub(1)))
}

async fn show_page<T>(list: &ListController<T>, query: QueryState) -> Result<()>
where
    T: TableRow + Clone + Send + Sync + 'static,
{
    let outcome = match list.fetch_page(query).await {
        FetchOutcome::Failed(err) if err.is_retryable() => {
            tracing::warn!(error = %err, "list fetch failed; retrying once");
            list.retry().await
        }
        outcome => outcome,
    };
    match outcome {
        FetchOutcome::Applied => {
            print!("{}", render_table(&list.snapshot().await));
            Ok(())
        }
        FetchOutcome::Failed(err) => bail!("Failed to Load Data: {}", err.user_message()),
        other => bail!("list fetch did not complete: {other:?}"),
    }
}

/// Prints queued notifications, then the refreshed list.
async fn report_mutation<T>(
    list: &Arc<ListController<T>>,
    events: &mut broadcast::Receiver<ListEvent>,
    result: Result<(), dashboard_core::FetchError>,
) -> Result<()>
where
    T: TableRow + Clone + Send + Sync + 'static,
{
    while let Ok(event) = events.try_recv() {
        match event {
            ListEvent::MutationSucceeded { label } => println!("{label}: done"),
            ListEvent::MutationFailed { label, message } => {
                eprintln!("{label} failed: {message}")
            }
            ListEvent::FetchFailed {
                message, retryable, ..
            } => {
                let hint = if retryable { " (run the command again to retry)" } else { "" };
                eprintln!("Failed to Load Data: {message}{hint}")
            }
        }
    }
    if let Err(err) = result {
        bail!(err.user_message());
    }
    print!("{}", render_table(&list.snapshot().await));
    Ok(())
}

async fn run_activities(
    client: &DashboardClient,
    command: ActivityCommand,
    page_size: u32,
) -> Result<()> {
    let list = client.activity_list();
    let mut events = list.subscribe_events();
    let result = match command {
        ActivityCommand::List(args) => {
            return show_page(&list, build_query(&args, page_size)).await
        }
        ActivityCommand::Create(form) => client.create_activity(&list, &form.into()).await,
        ActivityCommand::Update { id, form } => {
            client
                .update_activity(&list, &ActivityId(id), &form.into())
                .await
        }
        ActivityCommand::Delete { id } => client.delete_activity(&list, &ActivityId(id)).await,
    };
    report_mutation(&list, &mut events, result).await
}

async fn run_clients(
    client: &DashboardClient,
    command: ClientCommand,
    page_size: u32,
) -> Result<()> {
    let list = client.client_list();
    let mut events = list.subscribe_events();
    let result = match command {
        ClientCommand::List(args) => {
            return show_page(&list, build_query(&args, page_size)).await
        }
        ClientCommand::Create(form) => client.create_client(&list, &form.into()).await,
        ClientCommand::Update { id, form } => {
            client
                .update_client(&list, &ClientId(id), &form.into())
                .await
        }
        ClientCommand::Delete { id } => client.delete_client(&list, &ClientId(id)).await,
    };
    report_mutation(&list, &mut events, result).await
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings(cli.config.as_deref())?;
    if let Some(api_url) = cli.api_url {
        settings.api_base_url = api_url;
    }
    tracing::debug!(?settings, "settings loaded");
    let client = DashboardClient::new(&settings)?;

    match cli.resource {
        Resource::Activities { command } => {
            run_activities(&client, command, settings.page_size).await
        }
        Resource::Clients { command } => run_clients(&client, command, settings.page_size).await,
    }
}
