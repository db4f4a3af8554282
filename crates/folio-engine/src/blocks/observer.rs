use super::BlockId;

/// A structural change reported to observers. `index` is the position of
/// `block` among the children of `parent` at the time of the change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockEvent {
    pub parent: BlockId,
    pub block: BlockId,
    pub index: usize,
}

/// Hook for views that mirror the block tree.
///
/// Events fire after the links have been updated. A removed block may
/// already be destroyed when `block_removed` runs, so only its id and
/// former position are reliable.
pub trait BlockTreeObserver {
    fn block_inserted(&mut self, _event: &BlockEvent) {}

    fn block_removed(&mut self, _event: &BlockEvent) {}
}
