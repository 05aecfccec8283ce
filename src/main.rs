use anyhow::Result;
use clap::Parser;
use gosrc2pkg::commands::{self, DependsOptions, config::Config};
use std::io::Write;
use std::path::PathBuf;

/// gosrc2pkg - find the pkgsrc packages a Go source tree depends on
///
/// Walks a package below $GOPATH/src, collects the imports of every
/// directory and maps them onto the pkgsrc packages that provide them.
///
/// Examples:
///   gosrc2pkg depends github.com/owner/repo   # Report missing dependencies
///   gosrc2pkg index                           # Show the prefix index
#[derive(Parser, Debug)]
#[command(author, version = env!("GOSRC2PKG_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Top-level pkgsrc directory (also via PKGSRCDIR or PKGSRC; defaults to /usr/pkgsrc)
    #[arg(long, env = "PKGSRCDIR", value_name = "PATH", global = true)]
    pub pkgsrc: Option<PathBuf>,

    /// GOPATH holding the sources under src/ (defaults to $HOME/go)
    #[arg(long, env = "GOPATH", value_name = "PATH", global = true)]
    pub gopath: Option<PathBuf>,

    /// Go toolchain used to list the standard library
    #[arg(long, env = "GO", value_name = "PROGRAM", global = true)]
    pub go: Option<String>,

    /// Print verbose messages about what is happening (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print the reverse index of Go import paths to pkgsrc packages
    Index(IndexArgs),

    /// Print the pkgsrc dependencies of Go import paths
    Depends(DependsArgs),
}

#[derive(clap::Args, Debug)]
pub struct IndexArgs {
    /// Print the index as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(clap::Args, Debug)]
pub struct DependsArgs {
    /// Import paths below $GOPATH/src
    #[arg(value_name = "IMPORT_PATH", required = true)]
    pub paths: Vec<String>,

    /// Do not skip paths that are already part of a pkgsrc package
    #[arg(long, short)]
    pub force: bool,

    /// Extra build tags to consider satisfied
    #[arg(long, value_delimiter = ',', value_name = "TAG,...")]
    pub tags: Vec<String>,
}

fn init_logging(verbose: u8) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    match verbose {
        0 => {}
        1 => {
            builder.filter_level(log::LevelFilter::Info);
        }
        _ => {
            builder.filter_level(log::LevelFilter::Debug);
        }
    }
    builder.init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let runtime = gosrc2pkg::runtime::RealRuntime;
    let config = Config::new(runtime, cli.pkgsrc, cli.gopath, cli.go)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Index(args) => commands::index(&config, args.json, &mut out)?,
        Commands::Depends(args) => {
            let options = DependsOptions {
                force: args.force,
                tags: args.tags,
            };
            commands::depends(&config, &args.paths, &options, &mut out)?
        }
    }
    out.flush()?;
    Ok(())
}
