//! Lifecycle state and the in-memory snapshot

use serde::Serialize;
use soundboard_core::types::{Board, BoardId};

/// Manager lifecycle for one session
///
/// `Uninitialized -> Loading -> (SeedingDefault ->) Ready`. Removing the last
/// board passes through `SeedingDefault` again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum LifecycleState {
    #[default]
    Uninitialized,
    Loading,
    SeedingDefault,
    Ready,
}

impl LifecycleState {
    pub fn is_ready(self) -> bool {
        self == Self::Ready
    }
}

/// Committed boards plus the current selection
#[derive(Debug, Clone, Default)]
pub(crate) struct Snapshot {
    pub lifecycle: LifecycleState,
    pub boards: Vec<Board>,
    pub current: Option<BoardId>,
}

impl Snapshot {
    pub fn current_board(&self) -> Option<&Board> {
        let id = self.current?;
        self.boards.iter().find(|board| board.id == id)
    }
}
