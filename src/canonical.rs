//! Canonicalizer: order-independent fingerprints used for bucket placement.
//!
//! A fingerprint is a pre-filter, not an identity. Structurally equal keys
//! always share a fingerprint; unrelated keys may share one too (for example
//! the string `"{flag:1,idx:0}"` and the record `{idx: 0, flag: true}` in
//! coerce mode). The map resolves such collisions with its
//! [`Equivalence`](crate::Equivalence) policy.

use crate::key::{Key, KeyError};
use core::fmt;

/// Canonical encoding of a key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn new(encoded: impl Into<String>) -> Self {
        Fingerprint(encoded.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Maps a key to its bucket fingerprint.
///
/// Must be a pure function of the key's value, stable for the lifetime of
/// the map, and must give equivalent keys the same fingerprint.
pub trait Fingerprinter<K: ?Sized> {
    fn fingerprint(&self, key: &K) -> Result<Fingerprint, KeyError>;
}

impl<K: ?Sized, F> Fingerprinter<K> for F
where
    F: Fn(&K) -> Result<Fingerprint, KeyError>,
{
    fn fingerprint(&self, key: &K) -> Result<Fingerprint, KeyError> {
        self(key)
    }
}

/// How aggressively keys are normalized before encoding.
///
/// Every option only ever merges fingerprints of keys that are already
/// equivalent, or adds collisions between non-equivalent keys; none can
/// split equivalent keys apart. Record field names are always sorted.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CanonicalOptions {
    /// Encode scalars without type tags, so `true`, `1` and `"1"` share a
    /// fingerprint.
    pub coerce: bool,
    /// Trim surrounding whitespace from strings and symbols.
    pub trim: bool,
    /// Sort list items by their encoding; `[0,1]` and `[1,0]` then share a bucket.
    pub sort_lists: bool,
    /// Composites nested deeper than this are encoded as `[...]` / `{...}`.
    pub max_depth: Option<usize>,
}

impl Default for CanonicalOptions {
    fn default() -> Self {
        Self {
            coerce: true,
            trim: false,
            sort_lists: false,
            max_depth: None,
        }
    }
}

impl CanonicalOptions {
    /// Type-tagged scalars; fewer cross-shape collisions.
    pub fn strict() -> Self {
        Self {
            coerce: false,
            ..Self::default()
        }
    }

    pub fn with_trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    pub fn with_sort_lists(mut self, sort_lists: bool) -> Self {
        self.sort_lists = sort_lists;
        self
    }

    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Default fingerprinter for [`Key`].
#[derive(Clone, Debug, Default)]
pub struct Canonicalizer {
    options: CanonicalOptions,
}

impl Canonicalizer {
    pub fn new(options: CanonicalOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CanonicalOptions {
        &self.options
    }

    /// Encode `key` into its canonical string.
    pub fn encode(&self, key: &Key) -> Result<String, KeyError> {
        let mut out = String::new();
        self.encode_into(key, 0, &mut out)?;
        Ok(out)
    }

    fn truncated(&self, depth: usize) -> bool {
        self.options.max_depth.map_or(false, |max| depth >= max)
    }

    fn encode_into(&self, key: &Key, depth: usize, out: &mut String) -> Result<(), KeyError> {
        let coerce = self.options.coerce;
        match key {
            Key::Null => out.push_str(if coerce { "null" } else { "<:null>" }),
            Key::Bool(b) => {
                if coerce {
                    out.push_str(if *b { "1" } else { "0" });
                } else {
                    out.push_str(if *b { "<:bool>:true" } else { "<:bool>:false" });
                }
            }
            Key::Int(i) => {
                if !coerce {
                    out.push_str("<:int>:");
                }
                out.push_str(&i.to_string());
            }
            Key::Float(x) => {
                if !coerce {
                    out.push_str("<:float>:");
                }
                out.push_str(&encode_float(*x));
            }
            Key::Str(s) => {
                if !coerce {
                    out.push_str("<:str>:");
                }
                out.push_str(self.text(s));
            }
            Key::Symbol(s) => {
                if coerce {
                    out.push_str("Symbol(");
                    out.push_str(self.text(s));
                    out.push(')');
                } else {
                    out.push_str("<:symbol>:");
                    out.push_str(self.text(s));
                }
            }
            Key::List(items) => {
                if self.truncated(depth) {
                    items.iter().try_for_each(validate)?;
                    out.push_str("[...]");
                    return Ok(());
                }
                let mut parts = Vec::with_capacity(items.len());
                for item in items {
                    let mut part = String::new();
                    self.encode_into(item, depth + 1, &mut part)?;
                    parts.push(part);
                }
                if self.options.sort_lists {
                    parts.sort();
                }
                out.push('[');
                out.push_str(&parts.join(","));
                out.push(']');
            }
            Key::Record(fields) => {
                let sorted = sorted_fields(fields)?;
                if self.truncated(depth) {
                    sorted.iter().try_for_each(|(_, v)| validate(v))?;
                    out.push_str("{...}");
                    return Ok(());
                }
                out.push('{');
                for (i, (name, value)) in sorted.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    out.push_str(name);
                    out.push(':');
                    self.encode_into(value, depth + 1, out)?;
                }
                out.push('}');
            }
        }
        Ok(())
    }

    fn text<'a>(&self, s: &'a str) -> &'a str {
        if self.options.trim {
            s.trim()
        } else {
            s
        }
    }
}

impl Fingerprinter<Key> for Canonicalizer {
    fn fingerprint(&self, key: &Key) -> Result<Fingerprint, KeyError> {
        self.encode(key).map(Fingerprint)
    }
}

/// Fields sorted by name; rejects duplicate names.
fn sorted_fields(fields: &[(String, Key)]) -> Result<Vec<(&str, &Key)>, KeyError> {
    let mut sorted: Vec<(&str, &Key)> = fields.iter().map(|(n, v)| (n.as_str(), v)).collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    if let Some(w) = sorted.windows(2).find(|w| w[0].0 == w[1].0) {
        return Err(KeyError::DuplicateField {
            field: w[0].0.to_string(),
        });
    }
    Ok(sorted)
}

/// Shape check for subtrees hidden by `max_depth`.
fn validate(key: &Key) -> Result<(), KeyError> {
    match key {
        Key::List(items) => items.iter().try_for_each(validate),
        Key::Record(fields) => sorted_fields(fields)?
            .iter()
            .try_for_each(|(_, v)| validate(v)),
        _ => Ok(()),
    }
}

fn encode_float(x: f64) -> String {
    if x.is_nan() {
        "NaN".to_string()
    } else if x.is_infinite() {
        let s = if x > 0.0 { "Infinity" } else { "-Infinity" };
        s.to_string()
    } else if x == 0.0 {
        // -0.0 is equivalent to 0.0
        "0".to_string()
    } else {
        x.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(c: &Canonicalizer, k: &Key) -> String {
        c.fingerprint(k).unwrap().as_str().to_string()
    }

    fn idx_flag(idx: i64, flag_first: bool) -> Key {
        if flag_first {
            Key::record([("flag", Key::from(true)), ("idx", Key::from(idx))])
        } else {
            Key::record([("idx", Key::from(idx)), ("flag", Key::from(true))])
        }
    }

    /// Invariant: record encoding sorts field names and coerces scalars by default.
    #[test]
    fn record_encoding_is_sorted_and_coerced() {
        let c = Canonicalizer::default();
        assert_eq!(fp(&c, &idx_flag(0, false)), "{flag:1,idx:0}");
        assert_eq!(fp(&c, &idx_flag(0, true)), "{flag:1,idx:0}");
    }

    /// Invariant: list encoding preserves order unless list sorting is enabled.
    #[test]
    fn list_order_respected_by_default() {
        let c = Canonicalizer::default();
        assert_eq!(fp(&c, &Key::list([0, 1])), "[0,1]");
        assert_ne!(fp(&c, &Key::list([0, 1])), fp(&c, &Key::list([1, 0])));

        let sorting = Canonicalizer::new(CanonicalOptions::default().with_sort_lists(true));
        assert_eq!(
            fp(&sorting, &Key::list([0, 1])),
            fp(&sorting, &Key::list([1, 0]))
        );
    }

    /// Invariant: coerce mode merges scalar shapes; strict mode tags them apart.
    #[test]
    fn coerce_versus_strict() {
        let c = Canonicalizer::default();
        assert_eq!(fp(&c, &Key::from(1)), fp(&c, &Key::from("1")));
        assert_eq!(fp(&c, &Key::from(1)), fp(&c, &Key::from(true)));
        assert_eq!(fp(&c, &Key::from(1)), fp(&c, &Key::from(1.0)));

        let s = Canonicalizer::new(CanonicalOptions::strict());
        assert_eq!(fp(&s, &Key::from(1)), "<:int>:1");
        assert_eq!(fp(&s, &Key::from("1")), "<:str>:1");
        assert_eq!(fp(&s, &Key::from(true)), "<:bool>:true");
        assert_eq!(fp(&s, &Key::symbol("a")), "<:symbol>:a");
        assert_eq!(fp(&s, &Key::Null), "<:null>");
    }

    /// Invariant: equivalent floats share a fingerprint.
    #[test]
    fn float_normalization() {
        let c = Canonicalizer::default();
        assert_eq!(fp(&c, &Key::from(-0.0)), "0");
        assert_eq!(fp(&c, &Key::from(f64::NAN)), "NaN");
        assert_eq!(fp(&c, &Key::from(f64::NEG_INFINITY)), "-Infinity");
        assert_eq!(fp(&c, &Key::from(2.5)), "2.5");
    }

    /// Invariant: trimming only merges, so " a " and "a" share a bucket.
    #[test]
    fn trim_merges_whitespace_variants() {
        let c = Canonicalizer::new(CanonicalOptions::default().with_trim(true));
        assert_eq!(fp(&c, &Key::from(" a ")), fp(&c, &Key::from("a")));
        assert_ne!(
            fp(&Canonicalizer::default(), &Key::from(" a ")),
            fp(&Canonicalizer::default(), &Key::from("a"))
        );
    }

    /// Invariant: depth-limited encoding hides nested structure but stays deterministic.
    #[test]
    fn max_depth_truncates() {
        let c = Canonicalizer::new(CanonicalOptions::default().with_max_depth(Some(1)));
        let k = Key::record([("xs", Key::list([1, 2])), ("r", Key::record([("a", 1)]))]);
        assert_eq!(fp(&c, &k), "{r:{...},xs:[...]}");
        let top = Canonicalizer::new(CanonicalOptions::default().with_max_depth(Some(0)));
        assert_eq!(fp(&top, &k), "{...}");
        assert_eq!(fp(&top, &Key::from(7)), "7");
    }

    /// Invariant: duplicate field names are rejected at every depth, truncated or not.
    #[test]
    fn duplicate_fields_rejected() {
        let c = Canonicalizer::default();
        let dup = Key::record([("a", 1), ("a", 2)]);
        assert_eq!(
            c.fingerprint(&dup),
            Err(KeyError::DuplicateField {
                field: "a".to_string()
            })
        );
        let nested = Key::list([dup]);
        let shallow = Canonicalizer::new(CanonicalOptions::default().with_max_depth(Some(0)));
        assert!(shallow.fingerprint(&nested).is_err());
    }

    /// Invariant: repeated calls give identical fingerprints.
    #[test]
    fn fingerprint_is_stable() {
        let c = Canonicalizer::default();
        let k = Key::list([idx_flag(3, true), Key::symbol("s"), Key::Null]);
        assert_eq!(fp(&c, &k), fp(&c, &k));
        assert_eq!(fp(&c, &k), "[{flag:1,idx:3},Symbol(s),null]");
    }

    /// Invariant: closures act as fingerprinters.
    #[test]
    fn closure_fingerprinter() {
        let by_len = |s: &String| Ok::<_, KeyError>(Fingerprint::new(s.len().to_string()));
        assert_eq!(by_len.fingerprint(&"abc".to_string()).unwrap().as_str(), "3");
    }
}
