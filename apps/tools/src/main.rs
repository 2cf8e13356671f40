use anyhow::Result;
use clap::{Parser, Subcommand};
use server_api::ApiContext;
use shared::{domain::PointsKey, error::ApiException};
use storage::Storage;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://./data/ledger.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the ten seed records.
    InitLedger,
    List,
    /// Call a ledger function by name, e.g. `invoke recordPoints 11 S439 "1, 2" 1493512301 Rafa`.
    Invoke {
        function: String,
        #[arg(allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Transactions that wrote a key, oldest first.
    History {
        key: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    let cli = Cli::parse();
    let api = ApiContext::new(Storage::new(&cli.database_url).await?);
    info!(database_url = %cli.database_url, "ledger store opened");

    match cli.command {
        Command::InitLedger => {
            let receipts = server_api::init_ledger(&api)
                .await
                .map_err(ApiException::from)?;
            println!("seeded {} records", receipts.len());
        }
        Command::List => {
            let entries = server_api::query_all_points(&api)
                .await
                .map_err(ApiException::from)?;
            for entry in entries {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    entry.key,
                    entry.record.holder,
                    entry.record.scheme_id,
                    entry.record.timestamp,
                    entry.record.location
                );
            }
        }
        Command::Invoke { function, args } => {
            let output = server_api::invoke(&api, &function, &args)
                .await
                .map_err(ApiException::from)?;
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Command::History { key } => {
            let key = PointsKey(key);
            for tx in api.storage.transactions_for_key(&key).await? {
                println!(
                    "{}\t{}\t{}",
                    tx.committed_at.to_rfc3339(),
                    tx.function,
                    tx.tx_id
                );
            }
        }
    }

    Ok(())
}
