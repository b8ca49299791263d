// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    IfDef,
    IfNdef,
    If,
    /// A frame rewritten by `#else`.
    Else,
}

impl Display for FrameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FrameKind::IfDef => "ifdef",
            FrameKind::IfNdef => "ifndef",
            FrameKind::If => "if",
            FrameKind::Else => "else",
        };
        write!(f, "{}", name)
    }
}

/// One open conditional region.
///
/// `suppressed_here` is this frame's own verdict; `parent_suppressed` is
/// frozen at open time, so closing an inner frame never resurrects output
/// inside a dead outer region. `branch_taken` records whether any branch
/// of the chain has been active, which is what `#elif`/`#else` consult.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionalFrame {
    pub kind: FrameKind,
    pub label: String,
    pub opened_at_line: usize,
    pub parent_suppressed: bool,
    pub suppressed_here: bool,
    pub branch_taken: bool,
}

impl ConditionalFrame {
    /// Applies `#else`: the branch becomes active iff no earlier branch
    /// ran. The frame is re-labeled as an `else` opened at `line_no`.
    pub fn take_else_branch(&mut self, line_no: usize) {
        self.kind = FrameKind::Else;
        self.opened_at_line = line_no;
        if self.parent_suppressed {
            return;
        }
        if self.branch_taken {
            self.suppressed_here = true;
        } else {
            self.suppressed_here = false;
            self.branch_taken = true;
        }
    }

    /// Applies `#elif` with an already-evaluated condition.
    pub fn take_elif_branch(&mut self, condition_active: bool) {
        if self.parent_suppressed {
            return;
        }
        if self.branch_taken {
            self.suppressed_here = true;
        } else if condition_active {
            self.suppressed_here = false;
            self.branch_taken = true;
        } else {
            self.suppressed_here = true;
        }
    }
}

#[derive(Debug, Default)]
pub struct ConditionalStack {
    frames: Vec<ConditionalFrame>,
}

impl ConditionalStack {
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    /// Whether output is currently suppressed. Only the top frame needs
    /// consulting; ancestors are folded into `parent_suppressed`.
    pub fn suppressing(&self) -> bool {
        self.frames
            .last()
            .map(|frame| frame.parent_suppressed || frame.suppressed_here)
            .unwrap_or(false)
    }

    pub fn open(
        &mut self,
        kind: FrameKind,
        label: String,
        opened_at_line: usize,
        condition_active: bool,
    ) {
        let parent_suppressed = self.suppressing();
        let (suppressed_here, branch_taken) = if parent_suppressed {
            (false, false)
        } else {
            (!condition_active, condition_active)
        };
        self.frames.push(ConditionalFrame {
            kind,
            label,
            opened_at_line,
            parent_suppressed,
            suppressed_here,
            branch_taken,
        });
    }

    pub fn top_mut(&mut self) -> Option<&mut ConditionalFrame> {
        self.frames.last_mut()
    }

    pub fn last(&self) -> Option<&ConditionalFrame> {
        self.frames.last()
    }

    pub fn pop(&mut self) -> Option<ConditionalFrame> {
        self.frames.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{ConditionalStack, FrameKind};

    #[test]
    fn test_empty_stack_is_active() {
        let stack = ConditionalStack::new();
        assert_eq!(stack.suppressing(), false);
    }

    #[test]
    fn test_inactive_branch_suppresses() {
        let mut stack = ConditionalStack::new();
        stack.open(FrameKind::IfDef, "FOO".to_string(), 0, false);
        assert_eq!(stack.suppressing(), true);
        stack.pop();
        assert_eq!(stack.suppressing(), false);
    }

    #[test]
    fn test_nested_frame_inherits_suppression() {
        let mut stack = ConditionalStack::new();
        stack.open(FrameKind::IfDef, "FOO".to_string(), 0, false);
        // Inner condition holds, but the dead parent still wins.
        stack.open(FrameKind::IfDef, "BAR".to_string(), 1, true);
        assert_eq!(stack.suppressing(), true);

        // #else on the inner frame cannot resurrect it either.
        stack.top_mut().unwrap().take_else_branch(2);
        assert_eq!(stack.suppressing(), true);

        stack.pop();
        assert_eq!(stack.suppressing(), true);
    }

    #[test]
    fn test_else_flips_active_branch() {
        let mut stack = ConditionalStack::new();
        stack.open(FrameKind::IfDef, "FOO".to_string(), 0, true);
        assert_eq!(stack.suppressing(), false);

        stack.top_mut().unwrap().take_else_branch(3);
        assert_eq!(stack.suppressing(), true);
        let frame = stack.last().unwrap();
        assert_eq!(frame.kind, FrameKind::Else);
        assert_eq!(frame.opened_at_line, 3);
    }

    #[test]
    fn test_elif_chain_takes_first_true_branch_only() {
        let mut stack = ConditionalStack::new();
        stack.open(FrameKind::If, "0".to_string(), 0, false);
        assert_eq!(stack.suppressing(), true);

        stack.top_mut().unwrap().take_elif_branch(true);
        assert_eq!(stack.suppressing(), false);

        // A later true elif no longer activates.
        stack.top_mut().unwrap().take_elif_branch(true);
        assert_eq!(stack.suppressing(), true);

        stack.top_mut().unwrap().take_else_branch(5);
        assert_eq!(stack.suppressing(), true);
    }
}
