use clap::Parser;
use scop::build::build_site;
use scop::config::Config;
use std::path::PathBuf;
use std::process::exit;

/// A static site generator for a personal blog.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Project directory containing `config.toml`. Defaults to the current
    /// directory; parent directories are searched as well.
    directory: Option<PathBuf>,

    /// Directory into which the site is generated.
    #[arg(short, long, default_value = "public")]
    output: PathBuf,
}

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        eprintln!("{:#}", e);
        exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let args = Args::parse();
    let directory = match args.directory {
        Some(directory) => directory,
        None => std::env::current_dir()?,
    };
    let config = Config::from_directory(&directory, &args.output)?;
    build_site(&config)?;
    Ok(())
}
