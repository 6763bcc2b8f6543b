use crate::error::ShapeError;

use itertools::Itertools;

/// Sorted set of epoch indices whose second component is a position angle
///
/// Residuals of these components are computed as the shortest angular difference, so that
/// angles close to each other across the 0/2pi cut are treated as close.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct AngularIndices(Vec<usize>);

impl AngularIndices {
    /// Build the set and check that every index is a valid epoch index
    pub fn new(
        indices: impl IntoIterator<Item = usize>,
        n_epochs: usize,
    ) -> Result<Self, ShapeError> {
        let set: Self = indices.into_iter().collect();
        set.validate(n_epochs)?;
        Ok(set)
    }

    pub fn empty() -> Self {
        Self(vec![])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, epoch: usize) -> bool {
        self.0.binary_search(&epoch).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    /// Check that the set fits a table with `n_epochs` epochs
    pub fn validate(&self, n_epochs: usize) -> Result<(), ShapeError> {
        match self.0.last() {
            Some(&index) if index >= n_epochs => Err(ShapeError::AngularIndexOutOfBounds {
                index,
                epochs: n_epochs,
            }),
            _ => Ok(()),
        }
    }
}

impl FromIterator<usize> for AngularIndices {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self(iter.into_iter().sorted_unstable().dedup().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorted_and_deduplicated() {
        let set: AngularIndices = [3, 1, 3, 0].into_iter().collect();
        assert_eq!(set.as_slice(), &[0, 1, 3]);
        assert!(set.contains(3));
        assert!(!set.contains(2));
    }

    #[test]
    fn out_of_bounds() {
        assert_eq!(
            AngularIndices::new([0, 5], 5),
            Err(ShapeError::AngularIndexOutOfBounds {
                index: 5,
                epochs: 5
            })
        );
        assert!(AngularIndices::new([0, 4], 5).is_ok());
    }

    #[test]
    fn empty_is_valid_for_any_table() {
        assert!(AngularIndices::empty().validate(0).is_ok());
    }
}
