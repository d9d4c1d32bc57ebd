use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use eligibility::auth::{TokenCache, TokenClient, TokenOrigin};
use eligibility::bulk::{BulkRunner, RunStop};
use eligibility::cli::{CheckArgs, Cli, Commands};
use eligibility::client::EligibilityClient;
use eligibility::config::{self, Config, PartialResults};
use eligibility::errors::AppError;
use eligibility::store::{self, KeyValueStore};
use eligibility::{ingest, report, view};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "eligibility=info,elig=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Cli::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprint!("{}", view::render_error(&e));
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Cli) -> Result<(), AppError> {
    let cfg = config::load()?;

    let kv: Arc<dyn KeyValueStore> = if args.no_cache {
        Arc::new(store::DisabledStore)
    } else {
        store::from_path(cfg.state_path.clone())
    };
    let tokens = TokenClient::new(
        cfg.auth_url.clone(),
        cfg.credentials.clone(),
        cfg.default_expires_in,
        TokenCache::new(kv),
    )?;

    match args.command {
        Commands::Token => {
            let (_, origin) = tokens.get_token().await?;
            match origin {
                TokenOrigin::Cached => println!("Using cached token."),
                TokenOrigin::Fresh => println!("New token generated successfully."),
            }
            Ok(())
        }
        Commands::Rows { csv } => {
            let rows = ingest::load_rows(&csv)?;
            print!("{}", view::render_rows(&rows));
            Ok(())
        }
        Commands::Payload { csv, row } => {
            let rows = ingest::load_rows(&csv)?;
            let json = ingest::select_payload(&rows, row)?;
            println!("{}", json);
            Ok(())
        }
        Commands::Check(check) => run_check(&cfg, &tokens, check).await,
        Commands::Bulk {
            csv,
            export,
            raw,
            discard_partial,
        } => {
            let partial = if discard_partial {
                PartialResults::Discard
            } else {
                cfg.partial_results
            };
            run_bulk(&cfg, &tokens, &csv, export.as_deref(), raw, partial).await
        }
    }
}

async fn run_check(cfg: &Config, tokens: &TokenClient, args: CheckArgs) -> Result<(), AppError> {
    let payload = match (args.payload, args.payload_file, args.row, args.csv) {
        (Some(inline), _, _, _) => inline,
        (None, Some(path), _, _) => std::fs::read_to_string(path)?,
        (None, None, Some(row), Some(csv)) => {
            let rows = ingest::load_rows(&csv)?;
            ingest::select_payload(&rows, row)?
        }
        _ => return Err(AppError::PayloadParse("no payload given".into())),
    };

    let client = EligibilityClient::new(cfg.eligibility_url.clone())?;
    let response = client.check_single(tokens, &payload).await?;
    let pretty =
        serde_json::to_string_pretty(&response).map_err(|e| AppError::Internal(e.into()))?;
    println!("{}", pretty);
    Ok(())
}

async fn run_bulk(
    cfg: &Config,
    tokens: &TokenClient,
    csv: &std::path::Path,
    export: Option<&std::path::Path>,
    raw: bool,
    partial: PartialResults,
) -> Result<(), AppError> {
    let rows = ingest::load_rows(csv)?;
    let client = EligibilityClient::new(cfg.eligibility_url.clone())?;

    let run = BulkRunner::new(&client, partial).run_all(&rows, tokens).await;
    if run.stop == RunStop::MissingToken {
        return Err(AppError::MissingToken);
    }

    let table = report::to_table_rows(&run.outcomes);
    let distribution = report::to_distribution(&run.outcomes);

    if raw {
        print!("{}", view::render_raw_results(&run.outcomes));
    }
    if !table.is_empty() {
        println!("{}", view::render_table(&table));
        println!("{}", view::render_distribution(&distribution));
    }
    print!("{}", view::render_run_summary(&run));

    if let Some(path) = export {
        report::export_to_file(&table, path)?;
        println!("Results exported to {}", path.display());
    }

    match run.stop {
        RunStop::AuthExpired { .. } => Err(AppError::AuthExpired),
        _ => Ok(()),
    }
}
