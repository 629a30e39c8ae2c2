//! Progress callbacks of the loading pipeline.
//!
//! Loading happens in two phases. While the tables are streamed the
//! loaders report consumed input bytes; while cells are joined against the
//! tree the join step reports one event per registered tip.

use std::fmt::Debug;

use derive_more::{Add, AddAssign};

/// Number of input bytes consumed by a loader.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Add, AddAssign)]
#[repr(transparent)]
pub struct ByteNum(usize);

impl ByteNum {
    pub const ZERO: ByteNum = ByteNum(0);

    #[inline]
    #[must_use]
    pub const fn new(bytes: usize) -> Self {
        Self(bytes)
    }

    #[inline]
    #[must_use]
    pub const fn get(&self) -> usize {
        self.0
    }
}

/// Receives progress updates from the loaders and the join step.
pub trait ProgressNotifier: Debug {
    /// Bytes of a table consumed since the previous call, header and
    /// skipped lines included.
    fn processed_bytes(&self, bytes: ByteNum);

    /// Number of tip registrations the join step is about to perform, over
    /// all selected sites.
    fn set_tip_total(&self, num_tips: u64);

    fn tip_registered(&self);
}

/// Notifier that ignores every update.
#[derive(Clone, Debug)]
pub struct DummyProgressNotifier;

impl ProgressNotifier for DummyProgressNotifier {
    fn processed_bytes(&self, _bytes: ByteNum) {}

    fn set_tip_total(&self, _num_tips: u64) {}

    fn tip_registered(&self) {}
}
