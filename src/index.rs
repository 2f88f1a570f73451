use std::str::FromStr;

use rustc_hash::FxHashMap;

use crate::error::Error;
use crate::parser::parse_key_list;

/// What to do with a key found at one nesting level
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyRule {
    /// Drop the key and its whole value, whatever it contains
    Drop,
    /// Keep the key, but prune its value (if it is an object) with the nested index
    Descend(KeyPathIndex),
}

/// Trie of dotted key-path segments
///
/// Each level maps a single key segment to a [`KeyRule`]. A `Drop` rule is
/// terminal: it never holds children, and registering it erases any deeper
/// paths previously registered under the same segment. Because of that the
/// resulting index only depends on the set of paths, not on their order.
///
/// Paths are split on every `.`, so empty segments are literal empty-string
/// keys: `".a"` means key `a` under key `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyPathIndex {
    entries: FxHashMap<String, KeyRule>,
}

impl KeyPathIndex {
    /// Create an empty index (matches nothing)
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from a list of dotted paths
    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut index = Self::new();
        index.extend(paths);
        index
    }

    /// Register one dotted path
    ///
    /// A path whose prefix is already terminal is a no-op (the parent wins).
    /// A path ending on a segment that has children collapses that segment to
    /// terminal.
    pub fn insert(&mut self, path: &str) {
        let mut node = self;
        let mut segments = path.split('.').peekable();

        while let Some(segment) = segments.next() {
            if segments.peek().is_none() {
                node.entries.insert(segment.to_owned(), KeyRule::Drop);
                return;
            }

            let rule = node
                .entries
                .entry(segment.to_owned())
                .or_insert_with(|| KeyRule::Descend(KeyPathIndex::new()));

            match rule {
                KeyRule::Drop => return,
                KeyRule::Descend(child) => node = child,
            }
        }
    }

    /// Look up the rule for a key at this level
    #[inline]
    pub fn get(&self, key: &str) -> Option<&KeyRule> {
        self.entries.get(key)
    }

    /// Number of keys referenced at this level
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Canonical, sorted list of the dotted paths this index drops
    pub fn paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_paths(&mut Vec::new(), &mut out);
        out.sort();
        out
    }

    fn collect_paths<'a>(&'a self, prefix: &mut Vec<&'a str>, out: &mut Vec<String>) {
        for (segment, rule) in &self.entries {
            prefix.push(segment);
            match rule {
                KeyRule::Drop => out.push(prefix.join(".")),
                KeyRule::Descend(child) => child.collect_paths(prefix, out),
            }
            prefix.pop();
        }
    }
}

impl<S: AsRef<str>> Extend<S> for KeyPathIndex {
    fn extend<I: IntoIterator<Item = S>>(&mut self, paths: I) {
        for path in paths {
            self.insert(path.as_ref());
        }
    }
}

/// Parse a single-quoted array literal such as `['a.b', 'c']` into an index
impl FromStr for KeyPathIndex {
    type Err = Error;

    fn from_str(literal: &str) -> Result<Self, Self::Err> {
        let paths = parse_key_list(literal)?;
        Ok(Self::from_paths(&paths))
    }
}

impl<S: AsRef<str>> FromIterator<S> for KeyPathIndex {
    fn from_iter<I: IntoIterator<Item = S>>(paths: I) -> Self {
        Self::from_paths(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nested(entries: Vec<(&str, KeyRule)>) -> KeyRule {
        KeyRule::Descend(index_of(entries))
    }

    fn index_of(entries: Vec<(&str, KeyRule)>) -> KeyPathIndex {
        KeyPathIndex {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }

    #[test]
    fn test_empty_input() {
        let paths: Vec<&str> = Vec::new();
        let index = KeyPathIndex::from_paths(paths);
        assert!(index.is_empty());
        assert_eq!(index, KeyPathIndex::new());
    }

    #[test]
    fn test_top_level_keys() {
        let index = KeyPathIndex::from_paths(["a", "b", "c"]);
        assert_eq!(
            index,
            index_of(vec![
                ("a", KeyRule::Drop),
                ("b", KeyRule::Drop),
                ("c", KeyRule::Drop),
            ])
        );
    }

    #[test]
    fn test_single_nested_key() {
        let index = KeyPathIndex::from_paths(["a.b"]);
        assert_eq!(index, index_of(vec![("a", nested(vec![("b", KeyRule::Drop)]))]));
    }

    #[test]
    fn test_deeply_nested_key() {
        let index = KeyPathIndex::from_paths(["a.b.c.d"]);
        let expected = index_of(vec![(
            "a",
            nested(vec![("b", nested(vec![("c", nested(vec![("d", KeyRule::Drop)]))]))]),
        )]);
        assert_eq!(index, expected);
    }

    #[test]
    fn test_mixed_top_level_and_nested() {
        let index = KeyPathIndex::from_paths(["x", "a.b"]);
        assert_eq!(
            index,
            index_of(vec![
                ("x", KeyRule::Drop),
                ("a", nested(vec![("b", KeyRule::Drop)])),
            ])
        );
    }

    #[test]
    fn test_siblings_share_parent() {
        let index = KeyPathIndex::from_paths(["a.b", "a.c"]);
        assert_eq!(
            index,
            index_of(vec![(
                "a",
                nested(vec![("b", KeyRule::Drop), ("c", KeyRule::Drop)])
            )])
        );
    }

    #[test]
    fn test_parent_after_child_collapses() {
        let index = KeyPathIndex::from_paths(["a.b", "a"]);
        assert_eq!(index, index_of(vec![("a", KeyRule::Drop)]));
    }

    #[test]
    fn test_child_after_parent_is_noop() {
        let index = KeyPathIndex::from_paths(["a", "a.b", "a.b.c"]);
        assert_eq!(index, KeyPathIndex::from_paths(["a"]));
    }

    #[test]
    fn test_insert_after_build_collapses() {
        let mut index = KeyPathIndex::from_paths(["a.b", "a.c.d"]);
        index.insert("a");
        assert_eq!(index, KeyPathIndex::from_paths(["a"]));
    }

    #[test]
    fn test_order_independent() {
        assert_eq!(
            KeyPathIndex::from_paths(["a.b", "a.c"]),
            KeyPathIndex::from_paths(["a.c", "a.b"])
        );
        assert_eq!(
            KeyPathIndex::from_paths(["x.y.z", "x", "q"]),
            KeyPathIndex::from_paths(["q", "x", "x.y.z"])
        );
    }

    #[test]
    fn test_duplicates_are_idempotent() {
        assert_eq!(
            KeyPathIndex::from_paths(["a.b", "a.b", "c", "c"]),
            KeyPathIndex::from_paths(["a.b", "c"])
        );
    }

    #[test]
    fn test_empty_segments_are_literal_keys() {
        let index = KeyPathIndex::from_paths([".a", "b.", "c..d"]);
        assert_eq!(
            index,
            index_of(vec![
                ("", nested(vec![("a", KeyRule::Drop)])),
                ("b", nested(vec![("", KeyRule::Drop)])),
                ("c", nested(vec![("", nested(vec![("d", KeyRule::Drop)]))])),
            ])
        );

        let index = KeyPathIndex::from_paths([""]);
        assert_eq!(index.get(""), Some(&KeyRule::Drop));
    }

    #[test]
    fn test_paths_are_canonical() {
        let index = KeyPathIndex::from_paths(["props.secret", "a.b", "id", "a", "props.token"]);
        assert_eq!(index.paths(), vec!["a", "id", "props.secret", "props.token"]);
    }

    #[test]
    fn test_parse_from_literal() {
        let index: KeyPathIndex = "['a.b', 'a', 'c.d']".parse().unwrap();
        assert_eq!(index, KeyPathIndex::from_paths(["a", "c.d"]));

        let index: KeyPathIndex = "[]".parse().unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn test_parse_from_bad_literal() {
        let err = "['a".parse::<KeyPathIndex>().unwrap_err();
        assert!(matches!(
            err,
            Error::KeyList(crate::parser::ParseError::UnterminatedString { offset: 1 })
        ));
        assert!(!err.is_record_error());
        assert!(err.to_string().starts_with("malformed key list: "));
    }

    #[test]
    fn test_collect_from_iterator() {
        let index: KeyPathIndex = vec!["a.b".to_string(), "c".to_string()].into_iter().collect();
        assert_eq!(index.len(), 2);
        assert!(matches!(index.get("a"), Some(KeyRule::Descend(_))));
        assert_eq!(index.get("c"), Some(&KeyRule::Drop));
        assert_eq!(index.get("b"), None);
    }
}
