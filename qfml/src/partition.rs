//! Outbound interface to the likelihood engine.
//!
//! The engine only sees partitions: it asks for one with given
//! [`PartitionDims`] and receives each tip's observed states through
//! [`Partition::set_tip_states`]. [`TipStatePartition`] is an in-memory
//! partition that stores the encoded states.

use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::state::{StateBits, StateEncoder, ILLEGAL_STATE, UNDETERMINED_STATE};
use crate::tree::PhyloTree;

/// Error returned when registering tip states in a partition.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum PartitionError {
    /// The tip index is not lower than the number of tips.
    TipOutOfRange { tip: u32, tips: usize },
    /// The sequence has more characters than the partition has patterns.
    SequenceTooLong {
        tip: u32,
        len: usize,
        patterns: usize,
    },
    /// A character of the sequence maps to no state.
    IllegalState { tip: u32, ch: char },
}

impl Display for PartitionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PartitionError::TipOutOfRange { tip, tips } => {
                write!(f, "Tip index {} out of range ({} tips)", tip, tips)
            }
            PartitionError::SequenceTooLong { tip, len, patterns } => write!(
                f,
                "Sequence of tip {} has {} states, but the partition has {} patterns",
                tip, len, patterns
            ),
            PartitionError::IllegalState { tip, ch } => {
                write!(f, "Illegal state `{}` for tip {}", ch, tip)
            }
        }
    }
}

impl Error for PartitionError {}

/// Dimensions of a partition.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct PartitionDims {
    pub tips: usize,
    pub clv_buffers: usize,
    pub states: usize,
    pub patterns: usize,
    pub rate_matrices: usize,
    pub prob_matrices: usize,
    pub rate_categories: u32,
    pub scale_buffers: usize,
}

impl PartitionDims {
    /// Derives the dimensions of a single-site partition from the tree shape
    /// and the number of candidate alleles of the site.
    ///
    /// The state count includes a null state. The pattern count is the
    /// number of decimal digits of the allele count, since tip states are
    /// registered as the decimal representation of the allele id.
    ///
    /// # Examples
    /// ```
    /// use qfml::partition::PartitionDims;
    /// use qfml::tree::PhyloTree;
    ///
    /// let tree = PhyloTree::from_tip_labels(["a", "b", "c", "d"]);
    /// let dims = PartitionDims::for_site(&tree, 12, 1);
    ///
    /// assert_eq!(dims.states, 13);
    /// assert_eq!(dims.patterns, 2);
    /// assert_eq!(dims.prob_matrices, 6);
    /// ```
    #[must_use]
    pub fn for_site(tree: &PhyloTree, num_alleles: usize, rate_categories: u32) -> Self {
        Self {
            tips: tree.tip_count(),
            clv_buffers: tree.inner_count(),
            states: num_alleles + 1,
            patterns: num_alleles.to_string().len(),
            rate_matrices: 1,
            prob_matrices: tree.branch_count(),
            rate_categories,
            scale_buffers: tree.inner_count(),
        }
    }
}

/// A partition of the likelihood engine that accepts observed tip states.
pub trait Partition {
    fn dims(&self) -> &PartitionDims;

    /// Registers the observed states of the tip with clv index `tip_index`.
    /// Each byte of `sequence` is mapped to a state through `encoder`.
    fn set_tip_states(
        &mut self,
        tip_index: u32,
        encoder: &StateEncoder,
        sequence: &str,
    ) -> Result<(), PartitionError>;
}

/// In-memory partition storing one state vector per tip.
///
/// Sequences shorter than the pattern count are padded with
/// [`UNDETERMINED_STATE`].
#[derive(Debug, Clone)]
pub struct TipStatePartition {
    dims: PartitionDims,
    tip_states: Vec<Option<Vec<StateBits>>>,
}

impl TipStatePartition {
    #[must_use]
    pub fn new(dims: PartitionDims) -> Self {
        Self {
            dims,
            tip_states: vec![None; dims.tips],
        }
    }

    /// Returns the states of a tip, or `None` if the tip was not registered.
    #[must_use]
    pub fn tip_states(&self, tip_index: u32) -> Option<&[StateBits]> {
        self.tip_states
            .get(tip_index as usize)
            .and_then(|states| states.as_deref())
    }

    /// Number of tips with registered states.
    #[must_use]
    pub fn registered_tips(&self) -> usize {
        self.tip_states.iter().filter(|states| states.is_some()).count()
    }
}

impl Partition for TipStatePartition {
    fn dims(&self) -> &PartitionDims {
        &self.dims
    }

    fn set_tip_states(
        &mut self,
        tip_index: u32,
        encoder: &StateEncoder,
        sequence: &str,
    ) -> Result<(), PartitionError> {
        let slot = self
            .tip_states
            .get_mut(tip_index as usize)
            .ok_or(PartitionError::TipOutOfRange {
                tip: tip_index,
                tips: self.dims.tips,
            })?;
        if sequence.len() > self.dims.patterns {
            return Err(PartitionError::SequenceTooLong {
                tip: tip_index,
                len: sequence.len(),
                patterns: self.dims.patterns,
            });
        }

        let mut states = Vec::with_capacity(self.dims.patterns);
        for byte in sequence.bytes() {
            let state = encoder.state(byte);
            if state == ILLEGAL_STATE {
                return Err(PartitionError::IllegalState {
                    tip: tip_index,
                    ch: byte as char,
                });
            }
            states.push(state);
        }
        states.resize(self.dims.patterns, UNDETERMINED_STATE);

        *slot = Some(states);
        Ok(())
    }
}
