use smallvec::SmallVec;

/// A node address expressed as the sequence of child indices to follow from
/// the root of a file's syntax tree.
///
/// An empty path names the root itself. Four steps is enough to cover the
/// overwhelming majority of real nesting depths without spilling to the
/// heap; deeper trees simply allocate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Path {
    steps: SmallVec<[u32; 4]>,
}

impl Path {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_steps(steps: impl IntoIterator<Item = u32>) -> Self {
        Self { steps: steps.into_iter().collect() }
    }

    pub fn steps(&self) -> &[u32] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Returns a new path with `step` appended, naming the given child of
    /// the node this path names.
    pub fn child(&self, step: u32) -> Self {
        let mut steps = self.steps.clone();
        steps.push(step);
        Self { steps }
    }

    /// Whether `self` names `other` or a descendant of `other`.
    pub fn starts_with(&self, other: &Path) -> bool {
        self.steps.len() >= other.steps.len() && self.steps[..other.steps.len()] == other.steps[..]
    }

    /// Returns a new path naming `suffix` as if it were rooted at `self`,
    /// i.e. `self`'s steps followed by `suffix`'s steps.
    pub fn join(&self, suffix: &Path) -> Self {
        let mut steps = self.steps.clone();
        steps.extend(suffix.steps.iter().copied());
        Self { steps }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_starts_with_itself() {
        let root = Path::root();
        assert!(root.starts_with(&root));
    }

    #[test]
    fn descendant_starts_with_ancestor() {
        let a = Path::from_steps([1, 2]);
        let b = Path::from_steps([1, 2, 3]);
        assert!(b.starts_with(&a));
        assert!(!a.starts_with(&b));
    }

    #[test]
    fn join_prepends_prefix() {
        let prefix = Path::from_steps([1, 2]);
        let suffix = Path::from_steps([0]);
        assert_eq!(prefix.join(&suffix).steps(), &[1, 2, 0]);
    }

    #[test]
    fn unrelated_paths_do_not_match() {
        let a = Path::from_steps([1, 2]);
        let b = Path::from_steps([1, 3]);
        assert!(!a.starts_with(&b));
        assert!(!b.starts_with(&a));
    }
}
