//! Tips of the phylogenetic tree the cells are joined against.
//!
//! Only the tip labels and the topology counts of a rooted binary tree are
//! used here; traversal and likelihood computation belong to the engine the
//! resulting partitions are handed to.

use std::path::Path;

use anyhow::Context;
use log::info;
use newick::{one_from_filename, Newick};

use crate::key_index::{DuplicateKeyError, KeyIndex};

/// Mapping from tip label to the tip's clv index.
pub type TipIndex = KeyIndex<u32>;

/// A leaf of the tree.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Tip {
    label: String,
    clv_index: u32,
}

impl Tip {
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn clv_index(&self) -> u32 {
        self.clv_index
    }
}

/// Tip labels and shape of a rooted binary tree. Tip `i` owns clv index `i`.
#[derive(Debug, Clone)]
pub struct PhyloTree {
    tips: Vec<Tip>,
}

impl PhyloTree {
    /// Creates a tree with the given tip labels, in clv index order.
    ///
    /// # Examples
    /// ```
    /// use qfml::tree::PhyloTree;
    ///
    /// let tree = PhyloTree::from_tip_labels(["a", "b", "c"]);
    ///
    /// assert_eq!(tree.tip_count(), 3);
    /// assert_eq!(tree.inner_count(), 2);
    /// assert_eq!(tree.branch_count(), 4);
    /// ```
    #[must_use]
    pub fn from_tip_labels<I, T>(labels: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let tips = labels
            .into_iter()
            .zip(0..)
            .map(|(label, clv_index)| Tip {
                label: label.into(),
                clv_index,
            })
            .collect();

        Self { tips }
    }

    /// Reads a tree in Newick format. Unlabelled tips are named after their
    /// node id. The path must be valid UTF-8.
    pub fn from_newick_file(path: &Path) -> anyhow::Result<Self> {
        let filename = path
            .to_str()
            .with_context(|| format!("Tree path `{}` is not valid UTF-8", path.display()))?;
        let tree = one_from_filename(filename)
            .with_context(|| format!("Could not parse the Newick tree `{}`", path.display()))?;

        let labels: Vec<String> = tree
            .nodes()
            .filter(|&n| tree[n].is_leaf())
            .map(|n| {
                tree.name(n)
                    .map(ToOwned::to_owned)
                    .unwrap_or_else(|| format!("tip_{}", n))
            })
            .collect();

        let tree = Self::from_tip_labels(labels);
        tree.log_shape();
        Ok(tree)
    }

    fn log_shape(&self) {
        info!("Number of tip/leaf nodes in tree: {}", self.tip_count());
        info!("Number of inner nodes in tree: {}", self.inner_count());
        info!("Total number of nodes in tree: {}", self.node_count());
        info!("Number of branches in tree: {}", self.branch_count());
    }

    #[must_use]
    pub fn tips(&self) -> &[Tip] {
        &self.tips
    }

    #[inline]
    #[must_use]
    pub fn tip_count(&self) -> usize {
        self.tips.len()
    }

    #[inline]
    #[must_use]
    pub fn inner_count(&self) -> usize {
        self.tip_count().saturating_sub(1)
    }

    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.tip_count() + self.inner_count()
    }

    #[inline]
    #[must_use]
    pub fn branch_count(&self) -> usize {
        self.node_count().saturating_sub(1)
    }

    /// Builds the tip label index. Every label must be unique.
    pub fn tip_index(&self) -> Result<TipIndex, DuplicateKeyError> {
        let mut index = TipIndex::with_capacity(self.tip_count());
        for tip in &self.tips {
            index.insert(tip.label.as_str(), tip.clv_index)?;
        }

        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use crate::_internal_test_data::SIMPLE_TREE_NEWICK;
    use crate::key_index::DuplicateKeyError;
    use crate::tree::PhyloTree;

    #[test]
    fn tip_labels_get_consecutive_clv_indices() {
        let tree = PhyloTree::from_tip_labels(["x", "y"]);

        assert_eq!(tree.tips()[0].label(), "x");
        assert_eq!(tree.tips()[0].clv_index(), 0);
        assert_eq!(tree.tips()[1].label(), "y");
        assert_eq!(tree.tips()[1].clv_index(), 1);
    }

    #[test]
    fn shape_of_four_tip_tree() {
        let tree = PhyloTree::from_tip_labels(["a", "b", "c", "d"]);

        assert_eq!(tree.tip_count(), 4);
        assert_eq!(tree.inner_count(), 3);
        assert_eq!(tree.node_count(), 7);
        assert_eq!(tree.branch_count(), 6);
    }

    #[test]
    fn empty_tree_shape() {
        let tree = PhyloTree::from_tip_labels(Vec::<String>::new());

        assert_eq!(tree.inner_count(), 0);
        assert_eq!(tree.branch_count(), 0);
    }

    #[test]
    fn tip_index_resolves_labels() {
        let index = PhyloTree::from_tip_labels(["a", "b", "c"])
            .tip_index()
            .unwrap();

        assert_eq!(index.lookup("c"), Some(&2));
        assert_eq!(index.lookup("z"), None);
    }

    #[test]
    fn duplicate_tip_labels_are_rejected() {
        let error = PhyloTree::from_tip_labels(["a", "b", "a"])
            .tip_index()
            .unwrap_err();

        assert_eq!(error, DuplicateKeyError("a".to_owned()));
    }

    #[test]
    fn reads_newick_file() {
        let path = std::env::temp_dir().join(format!("qfml-tree-{}.nwk", std::process::id()));
        fs::write(&path, SIMPLE_TREE_NEWICK).unwrap();

        let tree = PhyloTree::from_newick_file(&path);
        fs::remove_file(&path).unwrap();
        let tree = tree.unwrap();

        assert_eq!(tree.tip_count(), 3);
        let mut labels: Vec<_> = tree.tips().iter().map(|tip| tip.label()).collect();
        labels.sort_unstable();
        assert_eq!(labels, vec!["cell_a", "cell_b", "cell_c"]);
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_newick_path_is_rejected() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;
        use std::path::Path;

        let path = Path::new(OsStr::from_bytes(b"tree-\xff.nwk"));
        let error = PhyloTree::from_newick_file(path).unwrap_err();

        assert!(format!("{}", error).contains("is not valid UTF-8"));
    }

    #[test]
    fn missing_newick_file() {
        let path = std::env::temp_dir().join("qfml-does-not-exist.nwk");

        assert!(PhyloTree::from_newick_file(&path).is_err());
    }
}
