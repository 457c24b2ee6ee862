use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use clf_config::{CollectorConfig, Dialect};
use clf_runtime::clf_debug;
use clf_runtime::tracing_init::init_tracing;

#[derive(Parser)]
#[command(name = "clf-gen", about = "Compile log forwarder specs into collector configuration")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ConfigArgs {
    /// Path to clf.toml
    #[arg(short, long, default_value = "clf.toml")]
    config: PathBuf,

    /// Override `[collector] dialect`
    #[arg(short, long)]
    dialect: Option<Dialect>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile the spec and write the collector configuration
    Generate {
        #[command(flatten)]
        args: ConfigArgs,

        /// Override `[collector] output`; `-` writes to stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Replace every output with stdout sinks
        #[arg(long)]
        debug: bool,
    },
    /// Validate the spec and print every diagnostic
    Check {
        #[command(flatten)]
        args: ConfigArgs,
    },
    /// Show which inputs reach which outputs
    Routes {
        #[command(flatten)]
        args: ConfigArgs,
    },
}

fn base_dir(config: &Path) -> &Path {
    config
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
}

fn load(args: &ConfigArgs) -> Result<CollectorConfig> {
    let mut config =
        clf_runtime::load_config(&args.config).map_err(|e| anyhow::anyhow!("{e}"))?;
    if let Some(dialect) = args.dialect {
        config.dialect = dialect;
    }
    Ok(config)
}

fn generate(mut config: CollectorConfig, output: Option<PathBuf>, debug: bool) -> Result<()> {
    match output {
        Some(p) if p.as_os_str() == "-" => config.output = None,
        Some(p) => config.output = Some(p),
        None => {}
    }
    config.options.debug |= debug;

    let generated = clf_runtime::generate(&config).map_err(|e| anyhow::anyhow!("{e}"))?;
    match &generated.written_to {
        Some(path) => eprintln!("wrote {} configuration to {}", generated.dialect, path.display()),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(generated.text.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn check(config: CollectorConfig) -> Result<()> {
    let color = std::io::stderr().is_terminal();
    let errors = clf_runtime::check(&config);

    if errors.is_empty() {
        if color {
            eprintln!("\x1b[1;32mNo issues found.\x1b[0m");
        } else {
            eprintln!("No issues found.");
        }
        return Ok(());
    }

    for e in &errors {
        let line = e.to_string();
        match line.strip_prefix("error") {
            Some(rest) if color => eprintln!("\x1b[1;31merror\x1b[0m{rest}"),
            _ => eprintln!("{line}"),
        }
    }
    eprintln!("\n{} error(s) for the {} dialect", errors.len(), config.dialect);
    process::exit(1);
}

fn routes(config: CollectorConfig) -> Result<()> {
    print!("{}", clf_runtime::routes(&config));
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = match &cli.command {
        Commands::Generate { args, .. } | Commands::Check { args } | Commands::Routes { args } => {
            args
        }
    };
    let config = load(args)?;
    let _guard = init_tracing(&config.logging, base_dir(&args.config))?;
    clf_debug!(sys, config = %args.config.display(), dialect = %config.dialect, "clf-gen starting");

    match cli.command {
        Commands::Generate { output, debug, .. } => generate(config, output, debug),
        Commands::Check { .. } => check(config),
        Commands::Routes { .. } => routes(config),
    }
}
