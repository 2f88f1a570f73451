use std::io::{BufRead, BufReader, Read, Write};

use serde_json::{Map, Value};
use sha2::{Digest, Sha256, Sha512};

use crate::error::{Error, Result};
use crate::index::{KeyPathIndex, KeyRule};

/// What the streaming driver does with a record that fails to decode or encode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Stop at the first bad record and return its error
    #[default]
    Abort,
    /// Log the bad record, write nothing for it and keep going
    Skip,
}

/// Checksum over the bytes written to the output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestAlgorithm {
    Sha256,
    Sha512,
}

impl DigestAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            DigestAlgorithm::Sha256 => "sha256",
            DigestAlgorithm::Sha512 => "sha512",
        }
    }
}

enum OutputHasher {
    Sha256(Sha256),
    Sha512(Sha512),
}

impl OutputHasher {
    fn update(&mut self, bytes: &[u8]) {
        match self {
            OutputHasher::Sha256(h) => h.update(bytes),
            OutputHasher::Sha512(h) => h.update(bytes),
        }
    }

    fn into_hex(self) -> String {
        match self {
            OutputHasher::Sha256(h) => hex::encode(h.finalize()),
            OutputHasher::Sha512(h) => hex::encode(h.finalize()),
        }
    }
}

impl From<DigestAlgorithm> for OutputHasher {
    fn from(algorithm: DigestAlgorithm) -> Self {
        match algorithm {
            DigestAlgorithm::Sha256 => OutputHasher::Sha256(Sha256::new()),
            DigestAlgorithm::Sha512 => OutputHasher::Sha512(Sha512::new()),
        }
    }
}

/// `Write` adapter that hashes every byte the wrapped writer accepts
///
/// Short writes are accounted for: only the accepted prefix of each buffer is
/// hashed, so the checksum always matches what reached `inner`.
pub struct DigestWriter<W> {
    inner: W,
    hasher: OutputHasher,
}

impl<W: Write> DigestWriter<W> {
    pub fn new(inner: W, algorithm: DigestAlgorithm) -> Self {
        DigestWriter {
            inner,
            hasher: algorithm.into(),
        }
    }

    /// Hand back the wrapped writer together with the lowercase hex checksum
    pub fn finish(self) -> (W, String) {
        (self.inner, self.hasher.into_hex())
    }
}

impl<W: Write> Write for DigestWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let accepted = self.inner.write(buf)?;
        self.hasher.update(&buf[..accepted]);
        Ok(accepted)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

/// Remove every key the index marks for dropping, in place
///
/// Only objects are pruned. Arrays and scalars are left untouched, including
/// when a `Descend` rule points at them.
pub fn prune_value(value: &mut Value, index: &KeyPathIndex) {
    if let Value::Object(map) = value {
        prune_object(map, index);
    }
}

fn prune_object(map: &mut Map<String, Value>, index: &KeyPathIndex) {
    if index.is_empty() {
        return;
    }

    map.retain(|key, value| match index.get(key) {
        None => true,
        Some(KeyRule::Drop) => false,
        Some(KeyRule::Descend(child)) => {
            prune_value(value, child);
            true
        }
    });
}

/// Filter one JSON record and write its compact encoding to `output`
///
/// Nothing is written unless the whole record decodes and encodes
/// successfully. No newline is appended.
///
/// ```
/// use json_drop_keys::{process_line, KeyPathIndex};
///
/// let index = KeyPathIndex::from_paths(["props.secret"]);
/// let mut out = Vec::new();
/// process_line(&index, br#"{"id": 1, "props": {"secret": "x", "public": "y"}}"#, &mut out).unwrap();
/// assert_eq!(out, br#"{"id":1,"props":{"public":"y"}}"#);
/// ```
pub fn process_line<W: Write>(index: &KeyPathIndex, line: &[u8], output: &mut W) -> Result<()> {
    let mut value: Value = serde_json::from_slice(line).map_err(Error::Decode)?;
    prune_value(&mut value, index);
    let encoded = serde_json::to_vec(&value).map_err(Error::Encode)?;
    output.write_all(&encoded)?;
    Ok(())
}

/// Counters reported by [`filter_lines_streaming`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamSummary {
    /// Non-blank input lines seen
    pub records_read: usize,
    /// Records written to the output
    pub records_written: usize,
    /// Records dropped under [`ErrorPolicy::Skip`]
    pub records_skipped: usize,
    /// Hex checksum of everything written, if requested
    pub digest: Option<String>,
}

/// Stream JSON Lines from `input` to `output`, dropping indexed keys from each record
///
/// This function:
/// - Reads input line by line, holding only the current line in memory
/// - Skips blank lines and strips a trailing `\r`
/// - Writes each filtered record followed by `\n`
/// - Applies `policy` to records that are not valid JSON
/// - Optionally computes a checksum of the filtered output
///
/// I/O errors always abort, regardless of `policy`.
pub fn filter_lines_streaming<R: Read, W: Write>(
    input: R,
    output: &mut W,
    index: &KeyPathIndex,
    policy: ErrorPolicy,
    digest_algorithm: Option<DigestAlgorithm>,
) -> Result<StreamSummary> {
    let mut reader = BufReader::new(input);

    let summary = match digest_algorithm {
        Some(algorithm) => {
            let mut hashed = DigestWriter::new(&mut *output, algorithm);
            let mut summary = process_records(&mut reader, &mut hashed, index, policy)?;
            hashed.flush()?;
            summary.digest = Some(hashed.finish().1);
            summary
        }
        None => {
            let summary = process_records(&mut reader, output, index, policy)?;
            output.flush()?;
            summary
        }
    };

    if summary.records_skipped > 0 {
        tracing::warn!(
            skipped = summary.records_skipped,
            read = summary.records_read,
            "some records were skipped"
        );
    }
    tracing::debug!(
        read = summary.records_read,
        written = summary.records_written,
        digest = summary.digest.as_deref().unwrap_or("-"),
        "stream finished"
    );

    Ok(summary)
}

fn process_records<R: Read, W: Write>(
    reader: &mut BufReader<R>,
    output: &mut W,
    index: &KeyPathIndex,
    policy: ErrorPolicy,
) -> Result<StreamSummary> {
    let mut summary = StreamSummary::default();
    let mut line = Vec::new();
    let mut record = Vec::new();
    let mut line_number = 0;

    loop {
        line.clear();
        let n = reader.read_until(b'\n', &mut line)?;
        if n == 0 {
            break; // EOF
        }
        line_number += 1;

        let trimmed = trim_line_ending(&line);
        if trimmed.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        summary.records_read += 1;

        // Encode into a scratch buffer so a failed record leaves no trace in the output
        record.clear();
        match process_line(index, trimmed, &mut record) {
            Ok(()) => {
                record.push(b'\n');
                output.write_all(&record)?;
                summary.records_written += 1;
            }
            Err(err) if err.is_record_error() && policy == ErrorPolicy::Skip => {
                tracing::warn!(line = line_number, error = %err, "skipping record");
                summary.records_skipped += 1;
            }
            Err(err) => {
                return Err(Error::Record {
                    line: line_number,
                    source: Box::new(err),
                })
            }
        }
    }

    Ok(summary)
}

#[inline]
fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
