use crate::aligner::{BlastnAligner, PairwiseAligner};
use crate::bridge::BridgeAssembly;
use crate::config::{BridgeConfig, ToolConfig};
use crate::consensus::{BlastnConsensus, ConsensusAligner};
use crate::error::BridgeError;
use crate::site::{load_site_fragments, site_dir, ResultWriter, Site};
use log::{error, info, warn};
use std::path::Path;

/// Aligner pair used for one site
pub type SiteTools = (Box<dyn PairwiseAligner>, Box<dyn ConsensusAligner>);

/// Counts over a batch of sites
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: usize,
    pub characterized: usize,
    pub failed: usize,
}

/// Bridge every site with blastn-backed aligners
pub fn run_bridge(
    sites: &[Site],
    config: &BridgeConfig,
    tools: &ToolConfig,
    work_dir: &Path,
    output_dir: &Path,
) -> Result<RunSummary, BridgeError> {
    let writer = ResultWriter::new(output_dir, config.me_type)?;
    let consensus = BlastnConsensus::new(BlastnAligner::new(&tools.blastn), &tools.consensus)?;

    run_sites(sites, config, work_dir, &writer, |dir| {
        let mut aligner = BlastnAligner::new(&tools.blastn);
        if tools.keep_alignments {
            aligner = aligner.keep_outputs_in(dir.join("alignments"));
        }
        let placement = consensus.clone().with_aligner(aligner.clone());
        let site_tools: SiteTools = (Box::new(aligner), Box::new(placement));
        Ok(site_tools)
    })
}

/// Bridge every site in order, isolating per-site failures.
///
/// `tools_for` receives the site directory and returns the aligners for that
/// site. Sites whose fragments cannot be loaded, bridged or characterized
/// land in the failed table; only tool setup and output errors stop the
/// batch.
pub fn run_sites<F>(
    sites: &[Site],
    config: &BridgeConfig,
    work_dir: &Path,
    writer: &ResultWriter,
    mut tools_for: F,
) -> Result<RunSummary, BridgeError>
where
    F: FnMut(&Path) -> Result<SiteTools, BridgeError>,
{
    let mut summary = RunSummary::default();

    for site in sites {
        info!("Bridge assembly process STARTED for {}", site);
        summary.processed += 1;
        let dir = site_dir(work_dir, config.me_type, site);
        let fragments = match load_site_fragments(&dir, config) {
            Ok(fragments) => fragments,
            Err(e) => {
                error!("Cannot load fragments for {}: {}", site, e);
                writer.record_failed(site, &e.to_string())?;
                summary.failed += 1;
                info!("Bridge assembly process ENDED for {}", site);
                continue;
            }
        };
        let (mut aligner, mut consensus) = tools_for(&dir)?;

        let result =
            BridgeAssembly::new(config, aligner.as_mut(), consensus.as_mut()).assemble(fragments);

        match result {
            Ok(outcome) => {
                let path = writer.write_scaffolds(site, &outcome.scaffolds)?;
                if outcome.is_characterized() {
                    info!(
                        "{} {} characterized ({} bp insertion) -> {}",
                        site,
                        outcome.annotation.characterization,
                        outcome.annotation.insertion_len(),
                        path.display()
                    );
                    writer.record_characterized(site, &outcome)?;
                    summary.characterized += 1;
                } else {
                    warn!("{} not characterized", site);
                    writer.record_failed(site, &BridgeError::ConsensusAlignmentFailed.to_string())?;
                    summary.failed += 1;
                }
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                error!("Bridge assembly failed for {}: {}", site, e);
                writer.record_failed(site, &e.to_string())?;
                summary.failed += 1;
            }
        }
        info!("Bridge assembly process ENDED for {}", site);
    }

    info!(
        "{} site(s) processed: {} characterized, {} failed",
        summary.processed, summary.characterized, summary.failed
    );
    Ok(summary)
}
