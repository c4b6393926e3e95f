//! unfoldcmp CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use uf_viz::SingularPolicy;
use uf_viz_render::config::{VizConfig, resolve_config};
use uf_viz_render::theme::BuiltinTheme;

mod bundle;
mod compare;

#[derive(Parser)]
#[command(name = "unfoldcmp")]
#[command(about = "unfoldcmp - score unfolding methods against truth and plot the comparison")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score every method per distribution and write the comparison figures
    Compare {
        /// Results bundle (JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Output root; figures go to <out-dir>/png and <out-dir>/pdf
        #[arg(long)]
        out_dir: PathBuf,

        /// Visualization config (YAML). Defaults to the classic theme.
        #[arg(long)]
        config: Option<PathBuf>,

        /// What to do with a singular covariance: reject | pseudo-inverse
        #[arg(long, default_value = "reject", value_parser = parse_policy)]
        singular_policy: SingularPolicy,

        /// Also write the plot artifact as <out-dir>/json/<name>.json
        #[arg(long)]
        emit_artifacts: bool,

        /// Stop at the first failing distribution
        #[arg(long)]
        fail_fast: bool,

        /// Only process these distributions (repeatable)
        #[arg(long, num_args = 1..)]
        only: Vec<String>,
    },

    /// Print a visualization config template (YAML) to stdout
    ConfigTemplate {
        /// Base theme: classic | paper | minimal
        #[arg(long, default_value = "classic")]
        theme: String,
    },
}

fn parse_policy(s: &str) -> std::result::Result<SingularPolicy, String> {
    SingularPolicy::parse(s).map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Compare {
            input,
            out_dir,
            config,
            singular_policy,
            emit_artifacts,
            fail_fast,
            only,
        } => {
            let config = load_config(config.as_ref())?;
            let opts = compare::CompareOptions {
                out_dir,
                policy: singular_policy,
                emit_artifacts,
                fail_fast,
                only,
            };
            compare::run(&input, &opts, &config)
        }
        Commands::ConfigTemplate { theme } => cmd_config_template(&theme),
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<VizConfig> {
    let Some(path) = path else {
        return Ok(VizConfig::default());
    };
    let yaml = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config = resolve_config(Some(&yaml))
        .with_context(|| format!("resolving config {}", path.display()))?;
    tracing::info!(path = %path.display(), theme = %config.theme, "loaded visualization config");
    Ok(config)
}

fn cmd_config_template(theme: &str) -> Result<()> {
    let theme = BuiltinTheme::parse(theme)
        .with_context(|| format!("unknown theme '{theme}' (expected classic, paper or minimal)"))?;
    print!("{}", theme.base_config().to_yaml()?);
    Ok(())
}
