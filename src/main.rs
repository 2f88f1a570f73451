use anyhow::Context;
use clap::{Parser, ValueEnum};
use json_drop_keys::{
    filter_lines_streaming, read_key_file, DigestAlgorithm, ErrorPolicy, KeyPathIndex,
};
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Drop keys (including dotted nested paths) from every record of a JSON Lines stream
#[derive(Debug, Parser)]
#[command(name = "json-drop-keys", version)]
#[command(after_help = "Examples:
  json-drop-keys --keys \"['props.secret', 'token']\" < in.jsonl > out.jsonl
  json-drop-keys --keys-file keys.txt --on-error skip in.jsonl out.jsonl
  json-drop-keys --keys \"['a.b']\" --digest sha256 in.jsonl")]
struct Cli {
    /// Keys to drop, as a single-quoted array literal, e.g. "['a.b', 'c']"
    #[arg(long, env = "JSON_DROP_KEYS", value_name = "LITERAL")]
    keys: Option<String>,

    /// File with one dotted key path per line (# starts a comment)
    #[arg(long, value_name = "PATH")]
    keys_file: Option<PathBuf>,

    /// What to do with a line that is not valid JSON
    #[arg(long, value_enum, default_value_t = OnError::Abort)]
    on_error: OnError,

    /// Compute a checksum of the filtered output and print it to stderr
    #[arg(long, value_enum, value_name = "ALGORITHM")]
    digest: Option<DigestArg>,

    /// Input file (- for stdin)
    #[arg(default_value = "-")]
    input: String,

    /// Output file (defaults to stdout)
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OnError {
    /// Stop at the first bad line and exit with an error
    Abort,
    /// Log the bad line and continue
    Skip,
}

impl From<OnError> for ErrorPolicy {
    fn from(value: OnError) -> Self {
        match value {
            OnError::Abort => ErrorPolicy::Abort,
            OnError::Skip => ErrorPolicy::Skip,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DigestArg {
    #[value(alias = "sha-256")]
    Sha256,
    #[value(alias = "sha-512")]
    Sha512,
}

impl From<DigestArg> for DigestAlgorithm {
    fn from(value: DigestArg) -> Self {
        match value {
            DigestArg::Sha256 => DigestAlgorithm::Sha256,
            DigestArg::Sha512 => DigestAlgorithm::Sha512,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let index = build_index(&cli)?;

    // Open input
    let input: Box<dyn Read> = if cli.input == "-" {
        Box::new(io::stdin().lock())
    } else {
        Box::new(
            File::open(&cli.input).with_context(|| format!("failed to open {}", cli.input))?,
        )
    };

    let policy = ErrorPolicy::from(cli.on_error);
    let digest_algorithm = cli.digest.map(DigestAlgorithm::from);

    let mut output: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let summary = filter_lines_streaming(input, &mut output, &index, policy, digest_algorithm)
        .context("failed to filter input")?;

    if let Some(path) = &cli.output {
        tracing::info!(path = %path.display(), records = summary.records_written, "output written");
    }
    if let (Some(algorithm), Some(checksum)) = (digest_algorithm, &summary.digest) {
        eprintln!("{}: {}", algorithm.name(), checksum);
    }

    Ok(())
}

/// Merge the key lists from `--keys` and `--keys-file` into one index
fn build_index(cli: &Cli) -> anyhow::Result<KeyPathIndex> {
    let mut index = match &cli.keys {
        Some(literal) => {
            let index: KeyPathIndex = literal.parse().context("invalid --keys value")?;
            tracing::debug!(paths = index.paths().len(), "loaded keys from --keys");
            index
        }
        None => KeyPathIndex::new(),
    };

    if let Some(path) = &cli.keys_file {
        let keys = read_key_file(path)
            .with_context(|| format!("failed to read keys file {}", path.display()))?;
        tracing::debug!(count = keys.len(), path = %path.display(), "loaded keys from file");
        index.extend(&keys);
    }

    if index.is_empty() {
        tracing::info!("no keys configured, records are re-encoded unchanged");
    } else {
        tracing::debug!(paths = ?index.paths(), "key path index built");
    }

    Ok(index)
}
