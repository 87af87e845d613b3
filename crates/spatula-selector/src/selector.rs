//! Cardinality contracts shared by every selector.

use std::fmt;

/// Which bound of a [`Cardinality`] was violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Exact,
    Min,
    Max,
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact => f.write_str("exactly"),
            Self::Min => f.write_str("at least"),
            Self::Max => f.write_str("at most"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SelectorError {
    #[error("{selector} got {actual} match(es), expected {kind} {expected}")]
    Cardinality {
        selector: String,
        kind: Bound,
        expected: usize,
        actual: usize,
    },

    #[error("invalid selector {selector:?}: {reason}")]
    Invalid { selector: String, reason: String },

    #[error("{selector} could not be evaluated: {reason}")]
    Evaluation { selector: String, reason: String },
}

/// How many matches a query is expected to produce.
///
/// When `exact` is set it is the only bound checked, otherwise `min` and `max`
/// are each checked when present. Bounds validate, they never truncate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cardinality {
    pub exact: Option<usize>,
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl Cardinality {
    /// No bound at all.
    pub const fn any() -> Self {
        Self {
            exact: None,
            min: None,
            max: None,
        }
    }

    pub const fn exactly(n: usize) -> Self {
        Self {
            exact: Some(n),
            ..Self::any()
        }
    }

    pub const fn at_least(n: usize) -> Self {
        Self {
            min: Some(n),
            ..Self::any()
        }
    }

    pub const fn at_most(n: usize) -> Self {
        Self {
            max: Some(n),
            ..Self::any()
        }
    }

    /// Fills every unset bound of `self` from `defaults`.
    pub fn or(self, defaults: Cardinality) -> Cardinality {
        Cardinality {
            exact: self.exact.or(defaults.exact),
            min: self.min.or(defaults.min),
            max: self.max.or(defaults.max),
        }
    }

    /// Returns the first violated bound with its expected value.
    pub fn check(&self, count: usize) -> Result<(), (Bound, usize)> {
        if let Some(exact) = self.exact {
            return if count == exact {
                Ok(())
            } else {
                Err((Bound::Exact, exact))
            };
        }
        if let Some(min) = self.min {
            if count < min {
                return Err((Bound::Min, min));
            }
        }
        if let Some(max) = self.max {
            if count > max {
                return Err((Bound::Max, max));
            }
        }
        Ok(())
    }
}

/// A query over some root `R` (a document, an element, ...) whose number of
/// matches is validated against a [`Cardinality`].
///
/// Implementors only say how raw matches are produced, validation is shared.
pub trait Selector<R>: fmt::Display {
    type Item;

    /// The configured default cardinality.
    fn cardinality(&self) -> Cardinality;

    /// Every raw match, in document order.
    fn get_items(&self, root: R) -> Result<Vec<Self::Item>, SelectorError>;

    fn select(&self, root: R) -> Result<Vec<Self::Item>, SelectorError> {
        self.select_with(root, Cardinality::any())
    }

    /// Like [`Selector::select`], bounds set in `overrides` replace the
    /// configured ones for this call only.
    fn select_with(
        &self,
        root: R,
        overrides: Cardinality,
    ) -> Result<Vec<Self::Item>, SelectorError> {
        let items = self.get_items(root)?;
        overrides
            .or(self.cardinality())
            .check(items.len())
            .map_err(|(kind, expected)| SelectorError::Cardinality {
                selector: self.to_string(),
                kind,
                expected,
                actual: items.len(),
            })?;
        Ok(items)
    }

    /// Exactly one match.
    fn select_one(&self, root: R) -> Result<Self::Item, SelectorError> {
        let mut items = self.select_with(root, Cardinality::exactly(1))?;
        Ok(items.swap_remove(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DummySelector {
        cardinality: Cardinality,
    }

    impl fmt::Display for DummySelector {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("DummySelector")
        }
    }

    impl Selector<usize> for DummySelector {
        type Item = usize;

        fn cardinality(&self) -> Cardinality {
            self.cardinality
        }

        fn get_items(&self, num_matches: usize) -> Result<Vec<usize>, SelectorError> {
            Ok((0..num_matches).collect())
        }
    }

    fn dummy(cardinality: Cardinality) -> DummySelector {
        DummySelector { cardinality }
    }

    #[test]
    fn exact_items() {
        let ds = dummy(Cardinality::exactly(3));

        assert_eq!(ds.select(3).unwrap(), vec![0, 1, 2]);
        assert!(ds.select(0).is_err());
        assert!(ds.select(4).is_err());

        assert_eq!(
            ds.select_with(2, Cardinality::exactly(2)).unwrap(),
            vec![0, 1]
        );
        assert!(ds.select_with(3, Cardinality::exactly(2)).is_err());

        // the override didn't stick
        assert_eq!(ds.cardinality(), Cardinality::exactly(3));
        assert_eq!(ds.select(3).unwrap().len(), 3);
    }

    #[test]
    fn min_items() {
        let ds = dummy(Cardinality::at_least(3));

        assert_eq!(ds.select(3).unwrap(), vec![0, 1, 2]);
        assert!(ds.select(2).is_err());
        assert_eq!(
            ds.select_with(2, Cardinality::at_least(2)).unwrap(),
            vec![0, 1]
        );
        assert!(ds.select_with(3, Cardinality::at_least(4)).is_err());
    }

    #[test]
    fn max_items() {
        let ds = dummy(Cardinality::at_most(3));

        assert_eq!(ds.select(3).unwrap(), vec![0, 1, 2]);
        assert!(ds.select(4).is_err());
        assert_eq!(
            ds.select_with(4, Cardinality::at_most(4)).unwrap(),
            vec![0, 1, 2, 3]
        );
        assert!(ds.select_with(5, Cardinality::at_most(4)).is_err());
    }

    #[test]
    fn exact_wins_over_bounds() {
        let ds = dummy(Cardinality {
            exact: None,
            min: Some(5),
            max: Some(6),
        });
        assert_eq!(ds.select_with(2, Cardinality::exactly(2)).unwrap().len(), 2);
        assert!(ds.select(2).is_err());
        assert!(ds.select(7).is_err());
        assert_eq!(ds.select(6).unwrap().len(), 6);
    }

    #[test]
    fn violation_details() {
        let ds = dummy(Cardinality::at_most(1));
        match ds.select(4) {
            Err(SelectorError::Cardinality {
                selector,
                kind,
                expected,
                actual,
            }) => {
                assert_eq!(selector, "DummySelector");
                assert_eq!(kind, Bound::Max);
                assert_eq!(expected, 1);
                assert_eq!(actual, 4);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn select_one() {
        let ds = dummy(Cardinality::any());
        assert_eq!(ds.select_one(1).unwrap(), 0);
        assert!(ds.select_one(0).is_err());
        assert!(ds.select_one(2).is_err());
    }
}
