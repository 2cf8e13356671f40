use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client_core::{HolderForm, HttpPointsClient, PointsForm, UiController};
use shared::{domain::PointsKey, protocol::RecordPointsRequest};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Query and update the points ledger")]
struct Args {
    #[arg(long, env = "POINTS_SERVER_URL", default_value = "http://127.0.0.1:8000")]
    server_url: String,
    /// Use the JSON /api/v1 routes instead of the legacy GET routes.
    #[arg(long)]
    v1: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every record, sorted by numeric key.
    All,
    Query {
        id: String,
    },
    Record {
        #[arg(long)]
        id: String,
        #[arg(long, allow_hyphen_values = true)]
        longitude: String,
        #[arg(long, allow_hyphen_values = true)]
        latitude: String,
        #[arg(long)]
        timestamp: String,
        #[arg(long)]
        holder: String,
        #[arg(long)]
        scheme_id: String,
    },
    ChangeHolder {
        id: String,
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    let args = Args::parse();
    let client = HttpPointsClient::new(&args.server_url)?;
    debug!(server_url = %args.server_url, v1 = args.v1, "points client ready");

    if args.v1 {
        return run_v1(&client, args.command).await;
    }

    let mut ui = UiController::new(client);
    match args.command {
        Command::All => ui.query_all_points().await?,
        Command::Query { id } => {
            ui.query_points(&id).await?;
            if ui.view().panels.error_query {
                println!("no points recorded under id {id}");
            }
        }
        Command::Record {
            id,
            longitude,
            latitude,
            timestamp,
            holder,
            scheme_id,
        } => {
            let form = PointsForm {
                id,
                longitude,
                latitude,
                timestamp,
                holder,
                scheme_id,
            };
            ui.record_points(&form).await?;
            println!("submitted {}", form.request_path());
        }
        Command::ChangeHolder { id, name } => {
            ui.change_holder(&HolderForm { id, name }).await?;
            if ui.view().panels.error_holder {
                println!("holder change failed: no points under that id");
            }
        }
    }

    println!("{}", serde_json::to_string_pretty(ui.view())?);
    Ok(())
}

async fn run_v1(client: &HttpPointsClient, command: Command) -> Result<()> {
    let output = match command {
        Command::All => serde_json::to_value(client.list_points().await?)?,
        Command::Query { id } => match client.fetch_points(&PointsKey(id.clone())).await? {
            Some(record) => serde_json::to_value(record)?,
            None => anyhow::bail!("no points recorded under id {id}"),
        },
        Command::Record {
            id,
            longitude,
            latitude,
            timestamp,
            holder,
            scheme_id,
        } => {
            let request = RecordPointsRequest {
                id: PointsKey(id),
                longitude: longitude
                    .trim()
                    .parse()
                    .with_context(|| format!("longitude '{longitude}' is not a number"))?,
                latitude: latitude
                    .trim()
                    .parse()
                    .with_context(|| format!("latitude '{latitude}' is not a number"))?,
                timestamp,
                holder,
                scheme_id,
            };
            serde_json::to_value(client.submit_points(&request).await?)?
        }
        Command::ChangeHolder { id, name } => {
            serde_json::to_value(client.transfer_points(&PointsKey(id), &name).await?)?
        }
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
