//! json-drop-keys - Fast streaming key filter for JSON Lines
//!
//! This library removes a configurable set of keys from newline-delimited
//! JSON records. Keys are named by dotted paths, so `props.secret` drops
//! `secret` inside the `props` object while keeping the rest of `props`.
//!
//! # Key Features
//!
//! - **True streaming**: Processes input line by line, one record in memory at a time
//! - **Nested paths**: Dotted paths reach keys at any object depth
//! - **Parent wins**: Dropping `a` makes `a.b` redundant, in any order
//! - **Faithful output**: Key order is kept and numbers never pass through floating point
//! - **Error policy**: Abort on the first bad record, or skip and log it
//! - **Checksums**: Optionally compute a SHA-256/SHA-512 digest of the output
//!
//! # Examples
//!
//! **Single record**:
//!
//! ```
//! use json_drop_keys::{process_line, KeyPathIndex};
//!
//! let index = KeyPathIndex::from_paths(["a.b.c"]);
//! let mut out = Vec::new();
//! process_line(&index, br#"{"a":{"b":{"c":1,"d":2}}}"#, &mut out).unwrap();
//! assert_eq!(String::from_utf8(out).unwrap(), r#"{"a":{"b":{"d":2}}}"#);
//! ```
//!
//! **Whole stream**, with keys given as a single-quoted array literal:
//!
//! ```no_run
//! use json_drop_keys::{filter_lines_streaming, parse_key_list, ErrorPolicy, KeyPathIndex};
//! use std::io;
//!
//! let keys = parse_key_list("['props.secret', 'token']").unwrap();
//! let index = KeyPathIndex::from_paths(&keys);
//! let mut output = io::stdout();
//! filter_lines_streaming(io::stdin(), &mut output, &index, ErrorPolicy::Skip, None).unwrap();
//! ```

pub mod error;
pub mod filter;
pub mod index;
pub mod parser;

pub use error::{Error, Result};
pub use filter::{
    filter_lines_streaming, process_line, prune_value, DigestAlgorithm, DigestWriter, ErrorPolicy,
    StreamSummary,
};
pub use index::{KeyPathIndex, KeyRule};
pub use parser::{parse_key_list, read_key_file, read_key_lines, ParseError};
