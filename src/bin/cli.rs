//! Administrative CLI: seed programs and scope rules, run migrations, kick
//! off a scan by hand. Grounded on `bin/dsl_cli.rs`'s
//! `clap::Parser`/`Subcommand` shape.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::json;

use recon_bus::{Event, EventBus};
use recon_orchestrator::{init_tracing, OrchestratorConfig};
use recon_store::repositories::{ProgramRepository, ScopeRuleRepository};
use recon_store::UnitOfWork;

#[derive(Parser)]
#[command(name = "recon-orchestrator")]
#[command(about = "Administrative CLI for the reconnaissance orchestrator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, env = "RECON_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations.
    Migrate,

    /// Create a program (idempotent by name).
    AddProgram { name: String },

    /// Add a scope rule to an existing program.
    AddScopeRule {
        program_id: String,
        /// domain | wildcard | regex | cidr
        kind: String,
        pattern: String,
        /// include | exclude
        action: String,
    },

    /// Publish a `<tool>_scan_requested` event to kick off a scan by hand.
    Publish {
        event: String,
        program_id: String,
        #[arg(long)]
        target: String,
        #[arg(long, default_value_t = 0.5)]
        confidence: f64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = match cli.config {
        Some(path) => OrchestratorConfig::load(&path)?,
        None => OrchestratorConfig::from_env(),
    };

    match cli.command {
        Commands::Migrate => {
            let pool = recon_store::connect(&config.database_url).await?;
            recon_store::run_migrations(&pool).await?;
            println!("migrations applied");
        }
        Commands::AddProgram { name } => {
            let pool = recon_store::connect(&config.database_url).await?;
            let mut uow = UnitOfWork::begin(&pool).await?;
            let program = ProgramRepository::get_or_create(&mut uow, &name).await?;
            uow.commit().await?;
            println!("{} {}", program.id, program.name);
        }
        Commands::AddScopeRule { program_id, kind, pattern, action } => {
            let pool = recon_store::connect(&config.database_url).await?;
            let program_id = uuid::Uuid::parse_str(&program_id)?;
            let mut uow = UnitOfWork::begin(&pool).await?;
            let rule = ScopeRuleRepository::create(&mut uow, program_id, &kind, &pattern, &action).await?;
            uow.commit().await?;
            println!("{} {} {} {}", rule.id, rule.kind, rule.pattern, rule.action);
        }
        Commands::Publish { event, program_id, target, confidence } => {
            let bus = EventBus::connect(&config.amqp_url).await?;
            let mut payload = Event::new(event)
                .with_target(target.clone())
                .with_source("cli")
                .with_confidence(confidence)
                .with_program_id(program_id);
            payload.extra.insert("targets".to_string(), json!([target]));
            bus.publish(&payload).await?;
            println!("published");
        }
    }

    Ok(())
}
