mod dry_run;
mod registry;

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use clap_complete::{generate, Shell};
use spatula::{HttpTransport, OutputDir, ScraperConfig, Transport};
use tokio::runtime;

pub use dry_run::{dry_run, DryRun};
pub use registry::{Definition, Registry};

/// Page-oriented web scraper
#[derive(Debug, Parser)]
#[command(name = "spatula", version)]
pub struct Args {
    #[command(subcommand)]
    pub cmd: SubCommand,
}

#[derive(Debug, clap::Subcommand)]
pub enum SubCommand {
    #[command(name = "test")]
    Test(TestArgs),
    #[command(name = "scrape")]
    Scrape(ScrapeArgs),
    #[command(hide = true)]
    Completion,
}

/// Run a single page and print the items it extracts
#[derive(Debug, clap::Args)]
pub struct TestArgs {
    /// Registered name of the page
    pub name: String,
    /// Input field given as key=value, may be repeated
    #[arg(long, short, value_parser = parse_key_value)]
    pub data: Vec<(String, String)>,
    /// Source to fetch instead of the page's example source
    #[arg(long, short)]
    pub source: Option<String>,
    /// Stop after the first page instead of following pagination
    #[arg(long)]
    pub no_pagination: bool,
    #[command(flatten)]
    pub config: ConfigArgs,
}

impl From<&TestArgs> for DryRun {
    fn from(args: &TestArgs) -> Self {
        Self {
            data: args.data.clone(),
            source: args.source.clone(),
            paginate: !args.no_pagination,
        }
    }
}

/// Run a page or workflow and save every item it produces
#[derive(Debug, clap::Args)]
pub struct ScrapeArgs {
    /// Registered name of the page or workflow
    pub name: String,
    /// Output directory, must be empty if it exists. Defaults to a new dated
    /// directory under the configured output root
    #[arg(long, short)]
    pub output_dir: Option<PathBuf>,
    /// When quiet no logs are outputted
    #[arg(long, short)]
    pub quiet: bool,
    #[command(flatten)]
    pub config: ConfigArgs,
}

#[derive(Debug, Default, clap::Args)]
pub struct ConfigArgs {
    /// Optional scraper yaml configuration file
    #[arg(env = "SPATULA_CONFIG", long = "config")]
    pub config_file: Option<PathBuf>,
    /// Override scraper's user agent
    #[arg(long)]
    pub user_agent: Option<String>,
    /// Override request timeout, in seconds
    #[arg(long)]
    pub timeout: Option<f32>,
    /// Skip TLS certificate verification
    #[arg(long)]
    pub no_verify: bool,
    /// Override the root of dated output directories
    #[arg(long)]
    pub output_root: Option<PathBuf>,
}

impl TryFrom<&ConfigArgs> for ScraperConfig {
    type Error = anyhow::Error;

    fn try_from(args: &ConfigArgs) -> Result<Self, Self::Error> {
        let mut conf = if let Some(file) = args.config_file.as_ref().map(File::open) {
            serde_yaml::from_reader(file?)?
        } else {
            ScraperConfig::default()
        };
        if let Some(user_agent) = &args.user_agent {
            conf.user_agent = user_agent.to_string();
        }
        if let Some(timeout) = args.timeout {
            conf.timeout = Some(timeout);
        }
        if args.no_verify {
            conf.verify = false;
        }
        if let Some(output_root) = &args.output_root {
            conf.output_root = output_root.clone();
        }
        conf.validate()?;
        Ok(conf)
    }
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got {s:?}")),
    }
}

/// Dry runs the page named in `args`, returns how many items it printed.
pub async fn test_page(
    registry: &Registry,
    args: &TestArgs,
    transport: &dyn Transport,
    out: &mut dyn Write,
) -> anyhow::Result<usize> {
    let definition = registry.get(&args.name)?;
    let opts = DryRun::from(args);
    definition
        .dry_run(&opts, transport, out)
        .await
        .with_context(|| format!("test of {} failed", args.name))
}

/// Runs the workflow named in `args` to completion, returns where its items
/// were saved.
pub async fn scrape(
    registry: &Registry,
    args: &ScrapeArgs,
    conf: &ScraperConfig,
    transport: &dyn Transport,
) -> anyhow::Result<OutputDir> {
    let definition = registry.get(&args.name)?;
    let workflow = definition.workflow()?;
    let mut output = match &args.output_dir {
        Some(dir) => OutputDir::create(dir)?,
        None => OutputDir::dated(&conf.output_root)?,
    };
    workflow.execute(transport, &mut output).await.with_context(|| {
        format!(
            "scrape of {} failed, {} objects kept in {}",
            args.name,
            output.count(),
            output.path().display()
        )
    })?;
    Ok(output)
}

fn init_logger(filter: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();
}

/// Parses the command line and runs it against `registry`.
pub fn run(registry: Registry) -> anyhow::Result<()> {
    let args = Args::parse();
    let rt = runtime::Builder::new_current_thread().enable_all().build()?;

    match args.cmd {
        SubCommand::Test(args) => {
            init_logger("debug,hyper=warn,reqwest=warn,html5ever=warn,selectors=warn");
            let conf = ScraperConfig::try_from(&args.config)?;
            let transport = HttpTransport::new(&conf)?;
            let mut stdout = io::stdout().lock();
            rt.block_on(test_page(&registry, &args, &transport, &mut stdout))?;
            Ok(())
        }
        SubCommand::Scrape(args) => {
            if !args.quiet {
                init_logger("info,hyper=warn,reqwest=warn");
            }
            let conf = ScraperConfig::try_from(&args.config)?;
            let transport = HttpTransport::new(&conf)?;
            let output = rt.block_on(scrape(&registry, &args, &conf, &transport))?;
            println!(
                "success: wrote {} objects to {}",
                output.count(),
                output.path().display()
            );
            Ok(())
        }
        SubCommand::Completion => {
            generate(Shell::Bash, &mut Args::command(), "spatula", &mut io::stdout());
            Ok(())
        }
    }
}
