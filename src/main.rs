use anyhow::{Context, Result};
use corpus_pipeline::{
    cli::{
        output::{banner, format_duration, format_timestamp, separator, style, ConsoleReporter, CHECK, CROSS, INFO},
        signals::{interrupt_then_force, shutdown_signal},
        terminal_output::TerminalOutputCallback,
        Cli, PipelineKind,
    },
    core::{definition::PipelineDefinition, OrchestratorConfig, Pipeline},
    execution::{ExecutionEngine, PipelineOutcome},
    index::ElasticClient,
    process::SubprocessRunner,
    ExecutionStatus,
};
use std::sync::Arc;
use tracing::{error, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() {
    let cli = Cli::from_args();

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", CROSS, style(format!("{:#}", e)).red());
            1
        }
    };

    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<i32> {
    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string().to_lowercase()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    let config = OrchestratorConfig::load(cli.config.as_deref())
        .context("Failed to load orchestrator config")?;

    let pipeline = match &cli.file {
        Some(path) => {
            let definition = PipelineDefinition::from_file(path)
                .with_context(|| format!("Failed to load pipeline definition {}", path.display()))?;
            println!("{} Loaded pipeline: {}", INFO, style(&definition.name).bold());
            definition.to_pipeline(&config)
        }
        None => match cli.pipeline {
            PipelineKind::Crawl => Pipeline::crawl(&config),
            PipelineKind::MultiState => Pipeline::multi_state(&config),
        },
    };

    let index = ElasticClient::new(&config.index).context("Failed to create index client")?;

    let mut engine = ExecutionEngine::new(SubprocessRunner::new(), index)
        .with_sample_size(config.sample_size)
        .with_output_callback(Arc::new(TerminalOutputCallback::new(cli.verbose)));
    if cli.no_report {
        engine = engine.without_report();
    }

    let reporter = ConsoleReporter::new();
    engine.add_event_handler(move |event| reporter.handle(&event));

    let shutdown = interrupt_then_force(shutdown_signal, || {
        std::process::exit(1);
    });
    let outcome = engine.execute(&pipeline, shutdown).await;
    print_final_status(&pipeline, &outcome);

    Ok(outcome.exit_code())
}

fn print_final_status(pipeline: &Pipeline, outcome: &PipelineOutcome) {
    match outcome.status() {
        ExecutionStatus::Completed => {
            println!("\n{}", banner("Pipeline Complete!"));
            println!(
                "{} {} completed {}",
                CHECK,
                style(&pipeline.name).bold(),
                style("successfully").green()
            );
            println!("{} Total duration: {}", CHECK, format_duration(outcome.state.elapsed()));
            if let Some(completed_at) = outcome.state.completed_at {
                println!("{} Completed at: {}", INFO, format_timestamp(completed_at));
            }

            if !pipeline.next_steps.is_empty() {
                println!("\n{}", style(separator('═')).cyan());
                println!("{}", style("Next Steps:").bold());
                for (i, hint) in pipeline.next_steps.iter().enumerate() {
                    println!("  {}. {}", i + 1, hint);
                }
                println!("{}\n", style(separator('═')).cyan());
            }
        }
        ExecutionStatus::Interrupted => {
            warn!("Pipeline interrupted by user");
            println!(
                "\n{} {} {}",
                CROSS,
                style(&pipeline.name).bold(),
                style("interrupted").yellow()
            );
        }
        _ => {
            println!(
                "\n{} {} {}",
                CROSS,
                style(&pipeline.name).bold(),
                style("failed").red()
            );
            if let Some(e) = &outcome.error {
                error!("{}", e);
            }
        }
    }
}
