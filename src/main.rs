//! # Media Library Tools - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing`
//! - Validazione della configurazione e risoluzione dei tool esterni
//!   prima di toccare qualsiasi file
//! - Avvio della utility richiesta
//!
//! ## Flusso di esecuzione:
//! 1. Parsa gli argomenti CLI
//! 2. Configura il logging (`RUST_LOG`, oppure DEBUG/WARN/INFO dai flag)
//! 3. Valida la configurazione del subcommand
//! 4. Carica il file di settings e risolve ffmpeg/ffprobe/HandBrakeCLI
//! 5. Esegue la utility con il runner di processi reale

use anyhow::Result;
use clap::Parser;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use media_library_tools::cli::{Cli, Command};
use media_library_tools::{
    CompatChecker, HdrTranscoder, HealthChecker, HealthFixer, LinkCreator, MediaInventory,
    ProcessRunner, QualityInspector, Tool, ToolPathResolver, ToolSet, ToolkitSettings,
};

fn init_logging(verbose: bool, quiet: bool) -> Result<()> {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

async fn resolve_tools(cli: &Cli, required: &[Tool]) -> Result<ToolSet> {
    let settings = ToolkitSettings::load(cli.settings.as_deref()).await?;
    let resolver = ToolPathResolver::new().with_overrides(settings.tools);
    debug!("Platform: {}", ToolSet::system_info());

    match ToolSet::resolve(&resolver, required) {
        Ok(tools) => Ok(tools),
        Err(e) => {
            let names: Vec<&str> = required.iter().map(|t| t.base_name()).collect();
            error!("{}", resolver.get_tools_report(&names).trim_end());
            Err(e.into())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet)?;

    let runner = ProcessRunner;
    let quiet = cli.quiet;

    match &cli.command {
        Command::Inspect(args) => {
            let config = args.clone().into_config();
            config.validate()?;
            let tools = resolve_tools(&cli, QualityInspector::<ProcessRunner>::required_tools()).await?;
            let summary = QualityInspector::new(&config, &runner, &tools, quiet).run().await?;
            info!("📄 Report: {}", summary.csv_path.display());
        }
        Command::Inventory(args) => {
            let config = args.clone().into_config();
            config.validate()?;
            let tools = resolve_tools(&cli, MediaInventory::<ProcessRunner>::required_tools()).await?;
            let summary = MediaInventory::new(&config, &runner, &tools, quiet).run().await?;
            info!("📄 Inventory: {}", summary.csv_path.display());
            info!("📄 Statistics: {}", summary.stats_path.display());
        }
        Command::HealthCheck(args) => {
            let config = args.clone().into_config();
            config.validate()?;
            let tools = resolve_tools(&cli, HealthChecker::<ProcessRunner>::required_tools()).await?;
            HealthChecker::new(&config, &runner, &tools, quiet).run().await?;
        }
        Command::Transcode(args) => {
            let config = args.clone().into_config();
            config.validate()?;
            let tools = resolve_tools(&cli, HdrTranscoder::<ProcessRunner>::required_tools()).await?;
            HdrTranscoder::new(&config, &runner, &tools, quiet).run().await?;
        }
        Command::FixHealth(args) => {
            let config = args.clone().into_config();
            config.validate()?;
            let tools = resolve_tools(&cli, HealthFixer::<ProcessRunner>::required_tools()).await?;
            HealthFixer::new(&config, &runner, &tools, quiet).run().await?;
        }
        Command::Link(args) => {
            let config = args.clone().into_config();
            config.validate()?;
            LinkCreator::new(&config).run().await?;
        }
        Command::Compat(args) => {
            let config = args.clone().into_config();
            config.validate()?;
            let tools = resolve_tools(&cli, CompatChecker::<ProcessRunner>::required_tools()).await?;
            CompatChecker::new(&config, &runner, &tools).run().await?;
        }
    }

    Ok(())
}
