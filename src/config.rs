use clap::ValueEnum;
use std::fmt;
use std::path::PathBuf;

/// Mobile element family being characterized; selects length defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MeType {
    Alu,
    L1,
    Sva,
}

impl MeType {
    /// Typical full-length insertion size (bp)
    pub fn avg_insertion_length(self) -> usize {
        match self {
            MeType::Alu => 300,
            MeType::L1 => 6000,
            MeType::Sva => 2000,
        }
    }

    /// Shortest extracted insertion accepted as a full characterization (bp)
    pub fn min_insertion_length(self) -> usize {
        match self {
            MeType::Alu => 200,
            MeType::L1 => 300,
            MeType::Sva => 300,
        }
    }

    /// Contigs shorter than this are dropped when a site is loaded (bp)
    pub fn min_contig_length(self) -> usize {
        match self {
            MeType::Alu => 100,
            MeType::L1 => 200,
            MeType::Sva => 200,
        }
    }
}

impl fmt::Display for MeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MeType::Alu => "ALU",
            MeType::L1 => "L1",
            MeType::Sva => "SVA",
        };
        write!(f, "{}", name)
    }
}

/// Geometric tolerances shared by the overlap validator, the flank filter
/// and the contig merger (bp).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryLimits {
    /// An alignment must start within this distance of a sequence start.
    pub anchor_window: i64,
    /// Unaligned tail a fragment must keep to count as contributing sequence.
    pub novel_margin: i64,
    /// How close a flank alignment must reach to the flank's inner end.
    pub reach_tolerance: i64,
    /// Overhang allowed at the edges of contig-to-contig and right-flank overlaps.
    pub overhang_tolerance: i64,
    /// Contigs whose flank alignment leaves less than this are removed.
    pub flank_filter_leftover: usize,
}

impl Default for GeometryLimits {
    fn default() -> Self {
        GeometryLimits {
            anchor_window: 50,
            novel_margin: 10,
            reach_tolerance: 15,
            overhang_tolerance: 25,
            flank_filter_leftover: 10,
        }
    }
}

/// Configuration for bridge assembly at one insertion site.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Element family; drives the length defaults below.
    pub me_type: MeType,

    /// Length of each reference flank (bp).
    /// Default: 400
    pub flanking_region: usize,

    /// Expected insertion length (bp). Defaults to the family's typical size.
    pub avg_insertion_length: usize,

    /// Shortest insertion accepted as fully characterized (bp).
    pub min_insertion_length: usize,

    /// Contigs below this length are ignored (bp).
    pub min_contig_length: usize,

    /// Floor for a fused sequence when the accumulator lacks both flank tags.
    /// Default: 200
    pub min_fused_length: usize,

    /// Geometric tolerances.
    pub limits: GeometryLimits,

    /// Marker token identifying the left flank in file names or descriptions.
    pub left_flank_tag: String,

    /// Marker token identifying the right flank.
    pub right_flank_tag: String,
}

impl BridgeConfig {
    pub fn for_me_type(me_type: MeType) -> Self {
        BridgeConfig {
            me_type,
            flanking_region: 400,
            avg_insertion_length: me_type.avg_insertion_length(),
            min_insertion_length: me_type.min_insertion_length(),
            min_contig_length: me_type.min_contig_length(),
            min_fused_length: 200,
            limits: GeometryLimits::default(),
            left_flank_tag: "left_flank".to_string(),
            right_flank_tag: "right_flank".to_string(),
        }
    }

    /// Floor applied once the accumulator already carries both flanks
    pub fn min_bridged_length(&self) -> usize {
        self.avg_insertion_length + 2 * self.flanking_region
    }

    /// Length above which a bridged accumulator may be joined by plain concatenation
    pub fn concat_fallback_length(&self) -> usize {
        self.avg_insertion_length + self.flanking_region
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig::for_me_type(MeType::Alu)
    }
}

/// External tool locations
#[derive(Debug, Clone)]
pub struct ToolConfig {
    /// Path to the `blastn` binary.
    pub blastn: PathBuf,
    /// FASTA with the element consensus sequence.
    pub consensus: PathBuf,
    /// Keep raw alignment outputs under `<site dir>/alignments`.
    pub keep_alignments: bool,
}
