//! Lightweight FASTA/FASTQ scanning.
//!
//! This is a heuristic, not a parser: it only looks at record header markers
//! and line lengths. Content that is not UTF-8 yields zeroed statistics and a
//! warning rather than an error.

use log::warn;
use matsya_common::model::edna::{FileFormat, SequenceStats};

/// `fastq` when the file name says so, `fasta` otherwise.
pub fn detect_format(file_name: &str) -> FileFormat {
    let name = file_name.to_ascii_lowercase();
    if name.ends_with(".fastq") || name.ends_with(".fq") || name.contains(".fastq.") {
        FileFormat::Fastq
    } else {
        FileFormat::Fasta
    }
}

pub fn scan_sequences(file_name: &str, content: &[u8]) -> SequenceStats {
    let file_format = detect_format(file_name);
    let text = match std::str::from_utf8(content) {
        Ok(text) => text,
        Err(e) => {
            warn!("could not read {file_name} as text, recording empty statistics: {e}");
            return SequenceStats {
                file_format,
                ..SequenceStats::default()
            };
        }
    };

    let lengths = match file_format {
        FileFormat::Fasta => fasta_lengths(text),
        FileFormat::Fastq => fastq_lengths(text),
    };
    let sequence_count = lengths.len() as u64;
    let avg_sequence_length = if lengths.is_empty() {
        0.0
    } else {
        lengths.iter().sum::<usize>() as f64 / lengths.len() as f64
    };

    SequenceStats {
        file_format,
        sequence_count,
        avg_sequence_length,
    }
}

/// Residue count per record: sequence lines following each `>` header.
fn fasta_lengths(text: &str) -> Vec<usize> {
    let mut lengths = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.starts_with('>') {
            lengths.push(0);
        } else if let Some(current) = lengths.last_mut() {
            *current += line.len();
        }
    }
    lengths
}

/// Residue count per record: every `@` line start opens a record, and the
/// sequence lines up to the `+` separator count toward it. Lines after the
/// separator are skipped until the next `@` line.
fn fastq_lengths(text: &str) -> Vec<usize> {
    let mut lengths = Vec::new();
    let mut in_sequence = false;
    for line in text.lines() {
        let line = line.trim();
        if line.starts_with('@') {
            lengths.push(0);
            in_sequence = true;
        } else if line.starts_with('+') {
            in_sequence = false;
        } else if in_sequence {
            if let Some(current) = lengths.last_mut() {
                *current += line.len();
            }
        }
    }
    lengths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fasta_with_three_headers() {
        let fasta = b">seq1 Tenualosa ilisha COI\nACGTACGT\nACGT\n>seq2\nACGTAC\n>seq3\r\nAC\r\n";
        let stats = scan_sequences("reads.fasta", fasta);
        assert_eq!(stats.file_format, FileFormat::Fasta);
        assert_eq!(stats.sequence_count, 3);
        assert!((stats.avg_sequence_length - 20.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn fasta_is_the_default_format() {
        assert_eq!(detect_format("sample.txt"), FileFormat::Fasta);
        assert_eq!(detect_format("RUN.FQ"), FileFormat::Fastq);
        assert_eq!(detect_format("run.fastq.txt"), FileFormat::Fastq);
    }

    #[test]
    fn fastq_sequence_lines_stop_at_the_separator() {
        let fastq = b"@r1\nACGT\n+\nIIII\n@r2\nACGTAA\n+r2\nIIIIII\n";
        let stats = scan_sequences("reads.fastq", fastq);
        assert_eq!(stats.file_format, FileFormat::Fastq);
        assert_eq!(stats.sequence_count, 2);
        assert!((stats.avg_sequence_length - 5.0).abs() < 1e-9);
    }

    #[test]
    fn fastq_counts_every_at_line_start() {
        let short_quality = b"@r1\nACGT\n+\nII\n@r2\nAC\n+\nII\n";
        assert_eq!(scan_sequences("reads.fq", short_quality).sequence_count, 2);

        // A quality line starting with `@` is counted as a header.
        let at_quality = b"@r1\nACGT\n+\n@III\n@r2\nACGT\n+\nIIII\n";
        let stats = scan_sequences("reads.fq", at_quality);
        assert_eq!(stats.sequence_count, 3);
        assert!((stats.avg_sequence_length - 8.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn non_utf8_content_gives_zeroed_stats() {
        let stats = scan_sequences("reads.fasta", &[0xff, 0xfe, b'>', b'A']);
        assert_eq!(stats.sequence_count, 0);
        assert_eq!(stats.avg_sequence_length, 0.0);
        assert_eq!(stats.file_format, FileFormat::Fasta);
    }

    #[test]
    fn text_without_headers_has_no_records() {
        let stats = scan_sequences("notes.txt", b"just some notes\n");
        assert_eq!(stats.sequence_count, 0);
        assert_eq!(stats.avg_sequence_length, 0.0);
    }
}
