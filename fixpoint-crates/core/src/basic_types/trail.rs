use std::iter::Rev;
use std::ops::Deref;
use std::vec::Drain;

use crate::fixpoint_assert_simple;

/// An undo log partitioned into checkpoints.
///
/// Entries describe how to revert a change; [`Trail::synchronise`] hands back every entry that
/// was pushed after the requested checkpoint, newest first, so that they can be undone in order.
#[derive(Clone, Debug)]
pub(crate) struct Trail<T> {
    /// `checkpoint_starts[i]` is the length of the trail when checkpoint `i + 1` was created.
    checkpoint_starts: Vec<usize>,
    entries: Vec<T>,
}

impl<T> Default for Trail<T> {
    fn default() -> Self {
        Trail {
            checkpoint_starts: Vec::default(),
            entries: Vec::default(),
        }
    }
}

impl<T> Trail<T> {
    pub(crate) fn new_checkpoint(&mut self) {
        self.checkpoint_starts.push(self.entries.len());
    }

    pub(crate) fn get_checkpoint(&self) -> usize {
        self.checkpoint_starts.len()
    }

    pub(crate) fn synchronise(&mut self, checkpoint: usize) -> Rev<Drain<'_, T>> {
        fixpoint_assert_simple!(
            checkpoint < self.get_checkpoint(),
            "cannot restore to checkpoint {checkpoint} from checkpoint {}",
            self.get_checkpoint()
        );

        let new_len = self.checkpoint_starts[checkpoint];
        self.checkpoint_starts.truncate(checkpoint);
        self.entries.drain(new_len..).rev()
    }

    pub(crate) fn push(&mut self, entry: T) {
        self.entries.push(entry)
    }
}

impl<T> Deref for Trail<T> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        &self.entries
    }
}
