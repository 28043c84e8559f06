use std::collections::BTreeSet;
use std::fs::File;
use std::io;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use tracing::{error, info};

use snxroster::{
    archive::{prepare_solution, ArchiveClient, SolutionReader},
    config::Config,
    constants::StationId,
    geodesy::Ellipsoid,
    listing::read_listing_file,
    pipeline::{Pipeline, PipelineConfig},
    sinex::BlockPolicy,
    store::{write_plan_csv, CsvStore},
};

#[derive(Parser)]
#[command(name = "snxroster")]
#[command(about = "Refresh scenario station rosters from IGS SINEX coordinate solutions")]
#[command(version)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Refresh the station coordinates and the roster of a scenario
    Update(RunArgs),
    /// Compute the mutations of an update and write them as CSV without applying them
    Plan {
        #[command(flatten)]
        run: RunArgs,
        /// Destination of the plan, stdout when absent
        #[arg(long)]
        output: Option<Utf8PathBuf>,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Scenario to refresh
    #[arg(long, default_value = "011888")]
    scenario_id: String,
    /// TOML configuration file
    #[arg(long)]
    config: Option<Utf8PathBuf>,
    /// Local solution file (.snx, .snx.gz or .snx.Z); downloaded from the archive when absent
    #[arg(long)]
    solution: Option<Utf8PathBuf>,
    /// Saved listing of the daily observation directory
    #[arg(long)]
    stations: Option<Utf8PathBuf>,
    /// Directory of the CSV station store
    #[arg(long)]
    store: Option<Utf8PathBuf>,
    /// Read every estimate block instead of the first one
    #[arg(long)]
    all_blocks: bool,
}

struct Prepared {
    pipeline: Pipeline,
    store: CsvStore,
    reader: SolutionReader,
}

fn known_stations(
    args: &RunArgs,
    config: &Config,
) -> Result<BTreeSet<StationId>, Box<dyn std::error::Error>> {
    let Some(listing) = args.stations.as_ref().or(config.listing.file.as_ref()) else {
        return Err("no station listing: pass --stations or set [listing] file".into());
    };
    Ok(read_listing_file(listing)?)
}

fn prepare(args: &RunArgs) -> Result<Prepared, Box<dyn std::error::Error>> {
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let pipeline = Pipeline::new(PipelineConfig {
        known_stations: known_stations(args, &config)?,
        ellipsoid: Ellipsoid::WGS84,
        block_policy: if args.all_blocks {
            BlockPolicy::AllBlocks
        } else {
            BlockPolicy::FirstBlockOnly
        },
    });

    let store_dir = args.store.clone().unwrap_or(config.store.dir.clone());
    let store = CsvStore::open(&store_dir)?;
    let scenario = pipeline.scenario(&args.scenario_id, &store)?;

    let reader = match &args.solution {
        Some(path) => prepare_solution(path)?,
        None => {
            let base_url = config.archive.base_url.clone();
            let client = ArchiveClient::new(config.archive)?;
            pipeline.retrieve(&client, &base_url, &scenario)?
        }
    };

    Ok(Prepared {
        pipeline,
        store,
        reader,
    })
}

fn execute(command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Update(args) => {
            let Prepared {
                pipeline,
                mut store,
                reader,
            } = prepare(&args)?;
            let report = pipeline.run(&args.scenario_id, reader, &mut store)?;
            println!("{report}");
        }
        Commands::Plan { run, output } => {
            let Prepared {
                pipeline,
                store,
                reader,
            } = prepare(&run)?;
            let diff = pipeline.plan(&run.scenario_id, reader, &store)?;
            match output {
                Some(path) => {
                    write_plan_csv(&diff, File::create(&path)?)?;
                    info!(%path, mutations = diff.mutations.len(), "plan written");
                }
                None => write_plan_csv(&diff, io::stdout().lock())?,
            }
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    snxroster::logging::init_logging(cli.verbose);

    if let Err(e) = execute(cli.command) {
        error!("{e}");
        std::process::exit(1);
    }
}
