use clap::Parser;
use log::{error, info};
use simple_logger::init_with_level;

use rnapipe::{
    cli::{Args, SubArgs},
    core::{run, targets, write},
};

fn main() {
    let start = std::time::Instant::now();
    let args: Args = Args::parse();

    if let Err(e) = init_with_level(args.level()) {
        eprintln!("ERROR: could not initialize logger: {}", e);
    }

    let result = match args.command {
        SubArgs::Run { args } => run(&args),
        SubArgs::Targets { args } => targets(&args).map(|_| ()),
        SubArgs::Write { args } => write(&args),
    };

    result.unwrap_or_else(|e| {
        error!("ERROR: {}", e);
        std::process::exit(1);
    });

    let elapsed = start.elapsed();
    info!("Elapsed time: {:.3?}", elapsed);
}
