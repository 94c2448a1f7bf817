use crate::alignment_record::AlignmentRecord;
use crate::blast_tab::parse_blast_tab;
use crate::error::BridgeError;
use crate::fragment::{write_fasta, SeqView};
use log::{debug, warn};
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::NamedTempFile;

/// Source of pairwise alignments between two sequences.
///
/// Records come back in the order the aligner reports them; callers rely on
/// that order for first-match selection.
pub trait PairwiseAligner {
    fn align(
        &mut self,
        query: SeqView<'_>,
        subject: SeqView<'_>,
    ) -> Result<Vec<AlignmentRecord>, BridgeError>;
}

/// Runs `blastn -query <q> -subject <s> -outfmt 6` once per pair
#[derive(Debug, Clone)]
pub struct BlastnAligner {
    blastn: PathBuf,
    keep_dir: Option<PathBuf>,
    calls: usize,
}

impl BlastnAligner {
    pub fn new(blastn: impl Into<PathBuf>) -> Self {
        BlastnAligner {
            blastn: blastn.into(),
            keep_dir: None,
            calls: 0,
        }
    }

    /// Keep every raw tabular output under `dir`
    pub fn keep_outputs_in(mut self, dir: impl Into<PathBuf>) -> Self {
        self.keep_dir = Some(dir.into());
        self
    }

    /// Run blastn on two FASTA files and return its tabular output
    pub fn run_files(&self, query: &Path, subject: &Path) -> Result<Vec<u8>, BridgeError> {
        let tool = self.blastn.display().to_string();
        debug!(
            "Running {} -query {} -subject {}",
            tool,
            query.display(),
            subject.display()
        );
        let output = Command::new(&self.blastn)
            .arg("-query")
            .arg(query)
            .arg("-subject")
            .arg(subject)
            .args(["-outfmt", "6"])
            .output()
            .map_err(|e| BridgeError::ExternalToolFailure {
                tool: tool.clone(),
                message: format!("failed to start: {}", e),
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() || stderr.to_ascii_lowercase().contains("error") {
            return Err(BridgeError::ExternalToolFailure {
                tool,
                message: format!("{} ({})", stderr.trim(), output.status),
            });
        }
        if !stderr.trim().is_empty() {
            warn!("{}: {}", tool, stderr.trim());
        }
        Ok(output.stdout)
    }

    fn keep_output(&self, query: &str, subject: &str, output: &[u8]) -> Result<(), BridgeError> {
        if let Some(dir) = &self.keep_dir {
            fs::create_dir_all(dir)?;
            let name = format!("{:04}.{}.{}.tab", self.calls, file_safe(query), file_safe(subject));
            fs::write(dir.join(name), output)?;
        }
        Ok(())
    }
}

impl PairwiseAligner for BlastnAligner {
    fn align(
        &mut self,
        query: SeqView<'_>,
        subject: SeqView<'_>,
    ) -> Result<Vec<AlignmentRecord>, BridgeError> {
        let query_file = write_temp_fasta(query)?;
        let subject_file = write_temp_fasta(subject)?;

        let output = self.run_files(query_file.path(), subject_file.path())?;
        self.calls += 1;
        self.keep_output(query.id, subject.id, &output)?;

        let records = parse_blast_tab(output.as_slice())?;
        debug!(
            "{} alignment(s) between {} and {}",
            records.len(),
            query.id,
            subject.id
        );
        Ok(records)
    }
}

/// Write one sequence to a temporary `.fa` file, removed on drop
pub fn write_temp_fasta(record: SeqView<'_>) -> Result<NamedTempFile, BridgeError> {
    let file = tempfile::Builder::new().suffix(".fa").tempfile()?;
    write_fasta(BufWriter::new(file.as_file()), &[record])?;
    Ok(file)
}

fn file_safe(id: &str) -> String {
    let mut name: String = id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect();
    // ids of long merged scaffolds grow with every fused fragment
    name.truncate(80);
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::read_fasta_records;

    #[test]
    fn test_write_temp_fasta() {
        let seq = b"ACGTNNACGT".to_vec();
        let file = write_temp_fasta(SeqView {
            id: "contig7",
            sequence: &seq,
        })
        .unwrap();
        assert!(file.path().extension().is_some_and(|e| e == "fa"));
        let records = read_fasta_records(file.path()).unwrap();
        assert_eq!(records, vec![("contig7".to_string(), seq)]);
    }

    #[test]
    fn test_missing_binary_is_tool_failure() {
        let mut aligner = BlastnAligner::new("/nonexistent/bin/blastn");
        let seq = b"ACGT".to_vec();
        let view = SeqView {
            id: "a",
            sequence: &seq,
        };
        match aligner.align(view, view) {
            Err(BridgeError::ExternalToolFailure { tool, .. }) => {
                assert!(tool.ends_with("blastn"))
            }
            other => panic!("unexpected result: {:?}", other.map(|r| r.len())),
        }
    }

    #[test]
    fn test_file_safe_names() {
        assert_eq!(file_safe("left_flank_Contig1"), "left_flank_Contig1");
        assert_eq!(file_safe("chr1:100 x/y"), "chr1_100_x_y");
        assert_eq!(file_safe(&"A".repeat(200)).len(), 80);
    }
}
