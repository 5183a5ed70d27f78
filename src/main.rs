use clap::Parser;
use color_eyre::eyre::Result;
use hdmc::config::HdmcConfig;
use hdmc::output::setup_logging;
use hdmc::simulation::Simulation;
use tracing::{error, info};

/// Hard-disk Monte Carlo in a periodic square cell.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the input parameter file
    #[arg(short, long, default_value = "./hdmc.inpt")]
    input: String,

    /// Path to the log file
    #[arg(long, default_value = "./hdmc.log")]
    log_file: String,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    setup_logging(&args.log_file)?;

    info!("Hard Disk Monte Carlo v{}", env!("CARGO_PKG_VERSION"));
    match run(&args) {
        Ok(()) => {
            info!("Simulation complete");
            Ok(())
        }
        Err(e) => {
            // every fatal condition reaches the log before the non-zero exit
            error!("{:#}", e);
            Err(e)
        }
    }
}

fn run(args: &Args) -> Result<()> {
    info!("Reading input parameters from {}", args.input);
    let config = HdmcConfig::from_file(&args.input)?;
    let mut simulation = Simulation::new(config)?;
    simulation.run()
}
