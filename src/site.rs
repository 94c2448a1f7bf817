use crate::bridge::SiteOutcome;
use crate::config::{BridgeConfig, MeType};
use crate::error::BridgeError;
use crate::fragment::{load_fragment, write_fasta, Fragment, Role, SeqView};
use crate::merger::Scaffold;
use log::{debug, info, warn};
use regex::Regex;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Insertion site: chromosome and 1-based breakpoint position
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Site {
    pub chromosome: String,
    pub position: u64,
}

impl Site {
    pub fn new(chromosome: &str, position: u64) -> Self {
        Site {
            chromosome: chromosome.to_string(),
            position,
        }
    }

    /// `chr_pos`, as used in directory and file names
    pub fn label(&self) -> String {
        format!("{}_{}", self.chromosome, self.position)
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chromosome, self.position)
    }
}

impl FromStr for Site {
    type Err = BridgeError;

    /// Parse `chr:pos`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let re = Regex::new(r"^([^:\s]+):(\d+)$").map_err(|e| BridgeError::InvalidInput(e.to_string()))?;
        let caps = re.captures(s.trim()).ok_or_else(|| {
            BridgeError::InvalidInput(format!("Site '{}' should be formatted as chr:pos", s))
        })?;
        let position = caps[2]
            .parse::<u64>()
            .map_err(|_| BridgeError::InvalidInput(format!("Invalid position in site '{}'", s)))?;
        Ok(Site::new(&caps[1], position))
    }
}

/// Read sites from a BED file (chrom, start, end[, name]).
///
/// The breakpoint is the first base after the 0-based BED start. Blank,
/// `#` and `track` lines are skipped.
pub fn parse_sites_bed(bed_file: &Path) -> io::Result<Vec<Site>> {
    let reader = BufReader::new(File::open(bed_file)?);
    let mut sites = Vec::new();

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() || line.starts_with('#') || line.starts_with("track") {
            continue;
        }
        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() < 3 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Invalid BED line: {}", line),
            ));
        }
        let start = parts[1]
            .parse::<u64>()
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "Invalid start value"))?;
        let end = parts[2]
            .parse::<u64>()
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "Invalid end value"))?;
        if start >= end {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Start value must be less than end value",
            ));
        }
        sites.push(Site::new(parts[0], start + 1));
    }

    Ok(sites)
}

/// Keep sites with list index in `[start, end)`
pub fn select_range(sites: Vec<Site>, start: Option<usize>, end: Option<usize>) -> Vec<Site> {
    let end = end.unwrap_or(sites.len()).min(sites.len());
    let start = start.unwrap_or(0).min(end);
    sites.into_iter().skip(start).take(end - start).collect()
}

/// Fragment directory of a site under the work directory
pub fn site_dir(work_dir: &Path, me_type: MeType, site: &Site) -> PathBuf {
    work_dir.join(format!("{}.{}", me_type, site.label()))
}

fn is_fasta(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| matches!(e, "fa" | "fasta" | "fna"))
}

/// Load the fragments of one site, ordered for bridging.
///
/// Each FASTA file in `dir` is one fragment. Contigs keep the natural order
/// of their file names and are placed between the left flank (first) and the
/// right flank (last). Contigs shorter than `min_contig_length` are skipped.
pub fn load_site_fragments(dir: &Path, config: &BridgeConfig) -> Result<Vec<Fragment>, BridgeError> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| {
            BridgeError::InvalidInput(format!(
                "Cannot read site directory '{}': {}",
                dir.display(),
                e
            ))
        })?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| is_fasta(path))
        .collect();
    files.sort_by(|a, b| natord::compare(&a.to_string_lossy(), &b.to_string_lossy()));

    let mut left = None;
    let mut right = None;
    let mut contigs = Vec::new();
    for path in &files {
        let fragment = load_fragment(path, config)?;
        match fragment.role {
            Role::LeftFlank | Role::RightFlank => {
                let slot = if fragment.role == Role::LeftFlank {
                    &mut left
                } else {
                    &mut right
                };
                if slot.is_some() {
                    warn!("Ignoring extra flank {} in {}", fragment.id, dir.display());
                } else {
                    *slot = Some(fragment);
                }
            }
            Role::Contig if fragment.len() < config.min_contig_length => {
                debug!(
                    "Skipping contig {} ({} bp < {} bp)",
                    fragment.id,
                    fragment.len(),
                    config.min_contig_length
                );
            }
            Role::Contig => contigs.push(fragment),
        }
    }

    let (Some(left), Some(right)) = (left, right) else {
        return Err(BridgeError::InvalidInput(format!(
            "Site directory '{}' lacks a {} or {} sequence",
            dir.display(),
            config.left_flank_tag,
            config.right_flank_tag
        )));
    };
    info!("Loaded {} contig(s) from {}", contigs.len(), dir.display());

    let mut fragments = Vec::with_capacity(contigs.len() + 2);
    fragments.push(left);
    fragments.extend(contigs);
    fragments.push(right);
    Ok(fragments)
}

/// Writes per-site scaffolds and the characterized/failed tables
pub struct ResultWriter {
    output_dir: PathBuf,
    me_type: MeType,
}

impl ResultWriter {
    pub fn new(output_dir: &Path, me_type: MeType) -> io::Result<Self> {
        fs::create_dir_all(output_dir.join("merged_contigs"))?;
        Ok(ResultWriter {
            output_dir: output_dir.to_path_buf(),
            me_type,
        })
    }

    pub fn characterized_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}.characterized.tsv", self.me_type))
    }

    pub fn failed_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.failed.tsv", self.me_type))
    }

    /// `merged_contigs/<me>.<chr>_<pos>.fa`, replaced on every run
    pub fn write_scaffolds(&self, site: &Site, scaffolds: &[Scaffold]) -> io::Result<PathBuf> {
        let path = self
            .output_dir
            .join("merged_contigs")
            .join(format!("{}.{}.fa", self.me_type, site.label()));
        let records: Vec<SeqView<'_>> = scaffolds.iter().map(|s| s.view()).collect();
        write_fasta(BufWriter::new(File::create(&path)?), &records)?;
        Ok(path)
    }

    fn append(&self, path: &Path, line: &str) -> io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", line)
    }

    pub fn record_characterized(&self, site: &Site, outcome: &SiteOutcome) -> io::Result<()> {
        let line = format!(
            "{}\t{}\t{}\t{}\t{}\t{}",
            site.chromosome,
            site.position,
            outcome.annotation.characterization,
            outcome.annotation.insertion_len(),
            if outcome.bridged { "bridge" } else { "left_right" },
            outcome.description()
        );
        self.append(&self.characterized_path(), &line)
    }

    pub fn record_failed(&self, site: &Site, reason: &str) -> io::Result<()> {
        let line = format!("{}\t{}\t{}", site.chromosome, site.position, reason);
        self.append(&self.failed_path(), &line)
    }
}
