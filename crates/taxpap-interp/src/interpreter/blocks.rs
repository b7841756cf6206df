//! Conditional block tracking for flat method bodies.
//!
//! Method bodies carry conditionals as markers: `IF` opens a block, `THEN` and
//! `ELSE` select a branch, and `BAUSTEINFINISH` closes the innermost block.
//! [`BlockTracker`] rebuilds the nesting from those markers as a stack of
//! frames. An empty stack means no conditional is open and everything runs.
//!
//! Rules for documents that leave a block unclosed:
//!
//! - An `IF` that arrives while the innermost block still awaits its branch
//!   replaces that block.
//! - An `ELSE` that arrives while the innermost block is already in its else
//!   branch closes that block first and applies to the enclosing one.
//! - An `IF` inside a `THEN` or `ELSE` branch always nests, even when the
//!   branch was never closed. Sequential blocks need a `BAUSTEINFINISH`
//!   between them; without one the second block only runs when the first
//!   block's else branch does.
//! - `THEN` or `ELSE` with no open block is ignored.

use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockState {
    /// `IF` seen, waiting for `THEN`.
    AwaitingBranch(bool),
    InThen(bool),
    InElse(bool),
}

#[derive(Debug, Clone, Copy)]
struct BlockFrame {
    state: BlockState,
    /// Whether the code around this block was running when it opened.
    enclosing_live: bool,
}

impl BlockFrame {
    fn is_live(&self) -> bool {
        self.enclosing_live
            && match self.state {
                BlockState::AwaitingBranch(_) => true,
                BlockState::InThen(condition) => condition,
                BlockState::InElse(condition) => !condition,
            }
    }

    fn condition(&self) -> bool {
        match self.state {
            BlockState::AwaitingBranch(c) | BlockState::InThen(c) | BlockState::InElse(c) => c,
        }
    }
}

/// Block stack of one executing method body.
#[derive(Debug, Default)]
pub struct BlockTracker {
    frames: SmallVec<[BlockFrame; 4]>,
}

impl BlockTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether non-structural operations at the current position execute.
    pub fn is_live(&self) -> bool {
        self.frames.last().map_or(true, BlockFrame::is_live)
    }

    /// Number of open blocks.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Handles `IF`. `condition` is ignored when the enclosing code is not
    /// live; callers pass `false` without evaluating anything in that case.
    pub fn open(&mut self, condition: bool) {
        if let Some(top) = self.frames.last_mut() {
            if matches!(top.state, BlockState::AwaitingBranch(_)) {
                let enclosing_live = top.enclosing_live;
                *top = BlockFrame {
                    state: BlockState::AwaitingBranch(condition && enclosing_live),
                    enclosing_live,
                };
                return;
            }
        }
        let enclosing_live = self.is_live();
        self.frames.push(BlockFrame {
            state: BlockState::AwaitingBranch(condition && enclosing_live),
            enclosing_live,
        });
    }

    /// Handles `THEN`.
    pub fn enter_then(&mut self) {
        match self.frames.last_mut() {
            Some(top) => top.state = BlockState::InThen(top.condition()),
            None => tracing::warn!("THEN outside of a conditional block ignored"),
        }
    }

    /// Handles `ELSE`.
    pub fn enter_else(&mut self) {
        while matches!(
            self.frames.last(),
            Some(BlockFrame {
                state: BlockState::InElse(_),
                ..
            })
        ) {
            self.frames.pop();
        }
        match self.frames.last_mut() {
            Some(top) => top.state = BlockState::InElse(top.condition()),
            None => tracing::warn!("ELSE outside of a conditional block ignored"),
        }
    }

    /// Handles `BAUSTEINFINISH`. Closing with no open block is a no-op.
    pub fn close(&mut self) {
        self.frames.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_tracker_is_live() {
        let mut blocks = BlockTracker::new();
        assert!(blocks.is_live());
        blocks.close();
        blocks.enter_then();
        blocks.enter_else();
        assert!(blocks.is_live());
        assert_eq!(blocks.depth(), 0);
    }

    #[test]
    fn branch_selection_follows_condition() {
        for condition in [true, false] {
            let mut blocks = BlockTracker::new();
            blocks.open(condition);
            assert!(blocks.is_live(), "code between IF and THEN runs");
            blocks.enter_then();
            assert_eq!(blocks.is_live(), condition);
            blocks.enter_else();
            assert_eq!(blocks.is_live(), !condition);
            blocks.close();
            assert!(blocks.is_live());
        }
    }

    #[test]
    fn nested_block_inside_untaken_branch_stays_dead() {
        let mut blocks = BlockTracker::new();
        blocks.open(false);
        blocks.enter_then();
        blocks.open(true);
        assert_eq!(blocks.depth(), 2);
        blocks.enter_then();
        assert!(!blocks.is_live());
        blocks.enter_else();
        assert!(!blocks.is_live());
        blocks.close();
        assert!(!blocks.is_live());
        blocks.enter_else();
        assert!(blocks.is_live());
        blocks.close();
        assert!(blocks.is_live());
    }

    #[test]
    fn nested_block_inside_taken_branch() {
        let mut blocks = BlockTracker::new();
        blocks.open(true);
        blocks.enter_then();
        blocks.open(false);
        blocks.enter_then();
        assert!(!blocks.is_live());
        blocks.enter_else();
        assert!(blocks.is_live());
        blocks.close();
        assert!(blocks.is_live());
        blocks.enter_else();
        assert!(!blocks.is_live());
    }

    #[test]
    fn if_awaiting_branch_is_replaced() {
        let mut blocks = BlockTracker::new();
        blocks.open(false);
        blocks.open(true);
        assert_eq!(blocks.depth(), 1);
        blocks.enter_then();
        assert!(blocks.is_live());
    }

    #[test]
    fn if_after_unclosed_else_nests_inside_it() {
        let mut blocks = BlockTracker::new();
        blocks.open(true);
        blocks.enter_then();
        assert!(blocks.is_live());
        blocks.enter_else();
        assert!(!blocks.is_live());
        // No BAUSTEINFINISH: this IF belongs to the dead else branch.
        blocks.open(true);
        assert_eq!(blocks.depth(), 2);
        blocks.enter_then();
        assert!(!blocks.is_live());
        blocks.close();
        assert_eq!(blocks.depth(), 1);
        assert!(!blocks.is_live());
    }

    #[test]
    fn second_else_closes_the_inner_block() {
        let mut blocks = BlockTracker::new();
        blocks.open(true);
        blocks.enter_then();
        blocks.open(true);
        blocks.enter_then();
        blocks.enter_else();
        assert_eq!(blocks.depth(), 2);
        // The inner block was never closed; this ELSE belongs to the outer IF.
        blocks.enter_else();
        assert_eq!(blocks.depth(), 1);
        assert!(!blocks.is_live());
    }
}
