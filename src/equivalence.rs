//! Equivalence: the single source of truth for "are these two keys the same key".
//!
//! Fingerprints only pre-filter candidates into a bucket; the map always
//! confirms a match with an [`Equivalence`] policy before reading, replacing
//! or removing an entry.

use crate::key::Key;

/// Decides whether two keys denote the same logical key.
///
/// Implementations must be reflexive, symmetric and transitive, and must
/// agree with the map's fingerprinter: equivalent keys must fingerprint
/// identically, otherwise they land in different buckets and never meet.
pub trait Equivalence<K: ?Sized> {
    fn equivalent(&self, a: &K, b: &K) -> bool;
}

impl<K: ?Sized, F> Equivalence<K> for F
where
    F: Fn(&K, &K) -> bool,
{
    fn equivalent(&self, a: &K, b: &K) -> bool {
        self(a, b)
    }
}

/// Deep structural equality over [`Key`]; the default policy.
#[derive(Copy, Clone, Debug, Default)]
pub struct StructuralEq;

impl Equivalence<Key> for StructuralEq {
    #[inline]
    fn equivalent(&self, a: &Key, b: &Key) -> bool {
        structurally_equal(a, b)
    }
}

/// Defers to the key type's own `PartialEq`, for host key types whose `==`
/// already is the wanted notion of sameness.
#[derive(Copy, Clone, Debug, Default)]
pub struct PartialEqEquivalence;

impl<K: ?Sized + PartialEq> Equivalence<K> for PartialEqEquivalence {
    #[inline]
    fn equivalent(&self, a: &K, b: &K) -> bool {
        a == b
    }
}

/// Recursive structural comparison.
///
/// Keys are owned trees, so recursion is bounded by the depth of the
/// shallower operand and always terminates.
pub fn structurally_equal(a: &Key, b: &Key) -> bool {
    match (a, b) {
        (Key::Null, Key::Null) => true,
        (Key::Bool(x), Key::Bool(y)) => x == y,
        (Key::Int(x), Key::Int(y)) => x == y,
        // NaN matches NaN, and 0.0 matches -0.0.
        (Key::Float(x), Key::Float(y)) => x == y || (x.is_nan() && y.is_nan()),
        (Key::Str(x), Key::Str(y)) => x == y,
        (Key::Symbol(x), Key::Symbol(y)) => x == y,
        (Key::List(xs), Key::List(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| structurally_equal(x, y))
        }
        (Key::Record(xs), Key::Record(ys)) => {
            if xs.len() != ys.len() {
                return false;
            }
            let mut xs: Vec<&(String, Key)> = xs.iter().collect();
            let mut ys: Vec<&(String, Key)> = ys.iter().collect();
            xs.sort_by(|p, q| p.0.cmp(&q.0));
            ys.sort_by(|p, q| p.0.cmp(&q.0));
            xs.iter()
                .zip(&ys)
                .all(|(x, y)| x.0 == y.0 && structurally_equal(&x.1, &y.1))
        }
        _ => false,
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        structurally_equal(self, other)
    }
}

impl Eq for Key {}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(fields: &[(&str, Key)]) -> Key {
        Key::record(fields.iter().cloned())
    }

    /// Invariant: field declaration order never affects record equality.
    #[test]
    fn records_ignore_field_order() {
        let a = rec(&[("idx", 0.into()), ("flag", true.into())]);
        let b = rec(&[("flag", true.into()), ("idx", 0.into())]);
        assert!(StructuralEq.equivalent(&a, &b));
        assert_eq!(a, b);
    }

    /// Invariant: records with differing field sets or values are not equal.
    #[test]
    fn records_compare_full_field_set() {
        let a = rec(&[("idx", 0.into()), ("flag", true.into())]);
        assert_ne!(a, rec(&[("idx", 0.into())]));
        assert_ne!(a, rec(&[("idx", 1.into()), ("flag", true.into())]));
        assert_ne!(a, rec(&[("idy", 0.into()), ("flag", true.into())]));
    }

    /// Invariant: lists are order-sensitive and length-sensitive.
    #[test]
    fn lists_are_ordered() {
        assert_eq!(Key::list([0, 1]), Key::list([0, 1]));
        assert_ne!(Key::list([0, 1]), Key::list([1, 0]));
        assert_ne!(Key::list([0, 1]), Key::list([0, 1, 2]));
    }

    /// Invariant: different shapes never match, even with identical text.
    #[test]
    fn shapes_are_distinct() {
        assert_ne!(Key::from(1), Key::from(1.0));
        assert_ne!(Key::from("1"), Key::from(1));
        assert_ne!(Key::from("x"), Key::symbol("x"));
        assert_ne!(Key::from(true), Key::from(1));
        assert_ne!(Key::Null, Key::list(Vec::<Key>::new()));
    }

    /// Invariant: equality is reflexive for floats, including NaN; signed zeros match.
    #[test]
    fn float_edge_cases() {
        assert_eq!(Key::from(f64::NAN), Key::from(f64::NAN));
        assert_eq!(Key::from(0.0), Key::from(-0.0));
        assert_ne!(Key::from(0.5), Key::from(1.5));
    }

    /// Invariant: comparison recurses through nested composites.
    #[test]
    fn nested_composites() {
        let a = rec(&[
            ("xs", Key::list([rec(&[("a", 1.into()), ("b", 2.into())])])),
            ("n", Key::Null),
        ]);
        let b = rec(&[
            ("n", Key::Null),
            ("xs", Key::list([rec(&[("b", 2.into()), ("a", 1.into())])])),
        ]);
        assert_eq!(a, b);
    }

    /// Invariant: closures and `PartialEqEquivalence` act as policies.
    #[test]
    fn alternative_policies() {
        let case_insensitive = |a: &String, b: &String| a.eq_ignore_ascii_case(b);
        assert!(case_insensitive.equivalent(&"ABC".to_string(), &"abc".to_string()));
        assert!(PartialEqEquivalence.equivalent(&3u8, &3u8));
        assert!(!PartialEqEquivalence.equivalent(&3u8, &4u8));
    }
}
