use clap::Parser;
use log::{error, info};
use mebridge::commands::bridge::run_bridge;
use mebridge::config::{BridgeConfig, MeType, ToolConfig};
use mebridge::site::{parse_sites_bed, select_range, Site};
use std::io;
use std::path::{Path, PathBuf};

/// Common options shared between all commands
#[derive(Parser, Debug)]
struct CommonOpts {
    /// Mobile element family of the insertions.
    #[clap(short = 'e', long, value_enum, default_value_t = MeType::Alu)]
    me_type: MeType,

    /// Path to the blastn binary.
    #[clap(long, value_parser, default_value = "blastn")]
    blastn: PathBuf,

    /// Verbosity level (0 = error, 1 = info, 2 = debug)
    #[clap(short, long, default_value = "0")]
    verbose: u8,
}

/// Bridge assembly of mobile element insertions from local contigs.
#[derive(Parser, Debug)]
#[command(author, version, about, disable_help_subcommand = true)]
enum Args {
    /// Bridge the contigs of one or more insertion sites between their flanks
    Bridge {
        #[clap(flatten)]
        common: CommonOpts,

        /// Single site in the format `chr:pos`
        #[clap(short = 's', long, value_parser)]
        site: Option<String>,

        /// Path to a BED file with insertion sites
        #[clap(short = 'b', long, value_parser)]
        sites_bed: Option<String>,

        /// Directory holding one `<ME>.<chr>_<pos>` fragment directory per site
        #[clap(short = 'w', long, value_parser)]
        work_dir: PathBuf,

        /// Directory for merged scaffolds and result tables
        #[clap(short = 'o', long, value_parser)]
        output_dir: PathBuf,

        /// FASTA file with the element consensus sequence
        #[clap(short = 'c', long, value_parser)]
        consensus: PathBuf,

        /// Length of each reference flank
        #[clap(long, value_parser, default_value_t = 400)]
        flanking_region: usize,

        /// Minimum contig length (defaults to the element family's value)
        #[clap(long, value_parser)]
        min_contig_length: Option<usize>,

        /// Index of the first site to process in the site list
        #[clap(long, value_parser)]
        start: Option<usize>,

        /// Index after the last site to process in the site list
        #[clap(long, value_parser)]
        end: Option<usize>,

        /// Keep raw pairwise alignment outputs in each site directory
        #[clap(long, action)]
        keep_alignments: bool,
    },
}

fn main() -> io::Result<()> {
    let args = Args::parse();

    match args {
        Args::Bridge {
            common,
            site,
            sites_bed,
            work_dir,
            output_dir,
            consensus,
            flanking_region,
            min_contig_length,
            start,
            end,
            keep_alignments,
        } => {
            initialize_logger(&common);

            let sites = load_sites(site.as_deref(), sites_bed.as_deref())?;
            let sites = select_range(sites, start, end);
            info!("{} site(s) to process", sites.len());

            let mut config = BridgeConfig::for_me_type(common.me_type);
            config.flanking_region = flanking_region;
            if let Some(min_contig_length) = min_contig_length {
                config.min_contig_length = min_contig_length;
            }
            let tools = ToolConfig {
                blastn: common.blastn,
                consensus,
                keep_alignments,
            };

            let summary = run_bridge(&sites, &config, &tools, &work_dir, &output_dir)
                .inspect_err(|e| error!("Bridge assembly aborted: {}", e))?;
            info!(
                "Done: {} characterized, {} failed",
                summary.characterized, summary.failed
            );
        }
    }

    Ok(())
}

fn initialize_logger(common: &CommonOpts) {
    env_logger::Builder::new()
        .filter_level(match common.verbose {
            0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();
}

fn load_sites(site: Option<&str>, sites_bed: Option<&str>) -> io::Result<Vec<Site>> {
    match (site, sites_bed) {
        (Some(site), None) => Ok(vec![site.parse::<Site>()?]),
        (None, Some(bed)) => parse_sites_bed(Path::new(bed)),
        _ => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "Either --site or --sites-bed must be provided, but not both",
        )),
    }
}
