use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use tracing::debug;

use llm::LlmClient;
use orchestrator::{
    Orchestrator, OrchestratorConfig, OutcomeStatus, RunStatus,
};
use router::TriageRouter;
use tools::{FlightSearchTool, Tool, ToolRegistry};

mod catalog;
mod config;

use config::AppConfig;

#[derive(Parser)]
#[command(name = "wayfarer")]
#[command(about = "Multi-agent travel assistant")]
#[command(version = "0.1.0")]
struct Cli {
    /// Run fully scripted: no credentials, no network.
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Route a travel question through the agent catalog and print the answer
    Ask {
        /// The question, as free text
        query: Vec<String>,
    },
    /// List the registered agents and routable intents
    Agents,
    /// Validate the routing table and exit
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_target(false)
        .init();
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Ask { query } => {
            let query = query.join(" ");
            if query.trim().is_empty() {
                bail!("empty query: tell me what you want to know");
            }
            let orchestrator = build_orchestrator(cli.offline)?;
            run_query(&orchestrator, &query).await
        }
        Commands::Agents => {
            let orchestrator = build_orchestrator(cli.offline)?;
            let registry = orchestrator.registry();
            println!("{}", style("Agents").bold());
            for name in registry.agent_names() {
                println!("  {name}");
            }
            println!("{}", style("Intents").bold());
            for intent in registry.intents() {
                println!("  {intent}");
            }
            Ok(())
        }
        Commands::Validate => {
            // Building the registry runs the full static validation; a bad
            // table is fatal here rather than at query time.
            build_orchestrator(cli.offline)?;
            println!("{} routing table is valid", style("ok").green());
            Ok(())
        }
    }
}

fn build_orchestrator(offline: bool) -> Result<Orchestrator> {
    if offline {
        let registry = catalog::offline_registry().context("routing table validation failed")?;
        return Ok(Orchestrator::new(
            Arc::new(registry),
            catalog::offline_router(),
            OrchestratorConfig::default(),
        ));
    }

    let app = AppConfig::from_env()?;
    debug!(provider = app.llm.provider_name(), "configured capability");
    let llm = LlmClient::from_config(&app.llm)?;

    let flight_search: Arc<dyn Tool> = match app.flight_search {
        Some(flight_config) => Arc::new(FlightSearchTool::new(flight_config)?),
        // Without a search backend the flight specialist still answers, it
        // just reports the lookup as failed.
        None => Arc::new(tools::ScriptedFlightSearch::failing()),
    };
    let toolbox = ToolRegistry::new().register(flight_search);

    let registry = catalog::live_registry(&llm, toolbox.get("flight_search")?)
        .context("routing table validation failed")?;
    let router = TriageRouter::new(llm);
    Ok(Orchestrator::new(
        Arc::new(registry),
        router,
        OrchestratorConfig::default(),
    ))
}

async fn run_query(orchestrator: &Orchestrator, query: &str) -> Result<()> {
    let result = orchestrator.handle(query).await?;

    for outcome in &result.outcomes {
        let marker = match &outcome.status {
            OutcomeStatus::Success => style("+").green(),
            OutcomeStatus::Failed(_) => style("x").red(),
            OutcomeStatus::TimedOut => style("t").yellow(),
        };
        let line = match &outcome.status {
            OutcomeStatus::Success => outcome.payload.render(),
            OutcomeStatus::Failed(reason) => format!("failed: {reason}"),
            OutcomeStatus::TimedOut => "timed out".to_string(),
        };
        println!("{marker} {}: {line}", style(&outcome.agent).bold());
    }

    println!();
    let status = match result.status {
        RunStatus::Complete => style(result.status.to_string()).green(),
        RunStatus::PartiallyComplete => style(result.status.to_string()).yellow(),
        RunStatus::Failed => style(result.status.to_string()).red(),
    };
    println!("{status}");
    println!("{}", result.final_payload);
    Ok(())
}
