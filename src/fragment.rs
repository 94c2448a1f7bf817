use crate::config::BridgeConfig;
use bio::alphabets::dna;
use bio::io::fasta;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

/// Part a fragment plays in a bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    LeftFlank,
    RightFlank,
    Contig,
}

impl Role {
    /// Infer the role from a file name and/or FASTA description.
    /// A left-flank marker wins if both markers are present.
    pub fn infer(labels: &[&str], config: &BridgeConfig) -> Role {
        if labels.iter().any(|l| l.contains(&config.left_flank_tag)) {
            Role::LeftFlank
        } else if labels.iter().any(|l| l.contains(&config.right_flank_tag)) {
            Role::RightFlank
        } else {
            Role::Contig
        }
    }

    pub fn is_flank(self) -> bool {
        !matches!(self, Role::Contig)
    }
}

/// A contig or reference flank taking part in bridging at one site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub id: String,
    pub sequence: Vec<u8>,
    pub role: Role,
}

/// Borrowed id + sequence handed to aligners
#[derive(Debug, Clone, Copy)]
pub struct SeqView<'a> {
    pub id: &'a str,
    pub sequence: &'a [u8],
}

impl Fragment {
    pub fn new(id: &str, sequence: &[u8], role: Role) -> Self {
        Fragment {
            id: id.to_string(),
            sequence: sequence.to_ascii_uppercase(),
            role,
        }
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn view(&self) -> SeqView<'_> {
        SeqView {
            id: &self.id,
            sequence: &self.sequence,
        }
    }
}

/// Which flanks a scaffold already contains
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlankTags {
    pub left: bool,
    pub right: bool,
}

impl FlankTags {
    pub fn of(role: Role) -> Self {
        FlankTags {
            left: role == Role::LeftFlank,
            right: role == Role::RightFlank,
        }
    }

    pub fn union(self, other: FlankTags) -> Self {
        FlankTags {
            left: self.left || other.left,
            right: self.right || other.right,
        }
    }

    pub fn both(self) -> bool {
        self.left && self.right
    }
}

/// Reverse complement of a DNA slice
pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    dna::revcomp(seq)
}

/// Load one fragment from a single-record FASTA file.
///
/// The role comes from the file name or the record description; the id is the
/// record id. Files holding more than one record use the first one.
pub fn load_fragment(path: &Path, config: &BridgeConfig) -> io::Result<Fragment> {
    let reader = fasta::Reader::new(File::open(path).map_err(|e| {
        io::Error::new(
            e.kind(),
            format!("Failed to open fragment file '{}': {}", path.display(), e),
        )
    })?);

    let record = match reader.records().next() {
        Some(record) => record?,
        None => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("No sequence found in '{}'", path.display()),
            ))
        }
    };
    record.check().map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Invalid FASTA record in '{}': {}", path.display(), e),
        )
    })?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let description = record.desc().unwrap_or("");
    let role = Role::infer(&[&file_name, record.id(), description], config);

    Ok(Fragment::new(record.id(), record.seq(), role))
}

/// Read every record of a FASTA file as (id, sequence)
pub fn read_fasta_records(path: &Path) -> io::Result<Vec<(String, Vec<u8>)>> {
    let reader = fasta::Reader::new(File::open(path)?);
    let mut records = Vec::new();
    for record in reader.records() {
        let record = record?;
        records.push((record.id().to_string(), record.seq().to_ascii_uppercase()));
    }
    Ok(records)
}

/// Write (id, sequence) pairs as FASTA
pub fn write_fasta<W: Write>(writer: W, records: &[SeqView<'_>]) -> io::Result<()> {
    let mut writer = fasta::Writer::new(writer);
    for record in records {
        writer.write(record.id, None, record.sequence)?;
    }
    writer.flush()
}
