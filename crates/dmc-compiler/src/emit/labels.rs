//! Forward labels and the stack depth recorded on each edge into them.

use dmc_core::InternalError;

/// A jump target, unique within one emitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Label(u32);

impl Label {
    pub fn id(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Default)]
struct LabelState {
    /// Offset the label was bound at.
    offset: Option<usize>,
    /// Stack depth every edge into the label must agree on.
    depth: Option<i32>,
    /// Jump operands waiting for the label to be bound.
    pending: Vec<usize>,
}

/// Per-emitter label namespace.
#[derive(Debug, Default)]
pub struct LabelTable {
    labels: Vec<LabelState>,
}

impl LabelTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self) -> Label {
        let label = Label(self.labels.len() as u32);
        self.labels.push(LabelState::default());
        label
    }

    fn state(&mut self, label: Label) -> Result<&mut LabelState, InternalError> {
        self.labels
            .get_mut(label.0 as usize)
            .ok_or_else(|| InternalError::Other {
                message: format!("label {} was never allocated", label.0),
            })
    }

    /// Record a jump to `label` whose operand sits at `operand` and which
    /// leaves the stack at `depth`.
    pub fn add_jump(
        &mut self,
        label: Label,
        operand: usize,
        depth: i32,
    ) -> Result<(), InternalError> {
        let state = self.state(label)?;
        if state.offset.is_some() {
            return Err(InternalError::Other {
                message: format!("backward jump to label {}", label.0),
            });
        }
        merge_depth(label, &mut state.depth, depth)?;
        state.pending.push(operand);
        Ok(())
    }

    /// Bind `label` at `offset`.
    ///
    /// `fallthrough` is the depth of the straight-line edge into the label,
    /// or `None` when the preceding code cannot fall through. Returns the
    /// jump operands to patch and the depth at the label, if any edge
    /// reaches it.
    pub fn bind(
        &mut self,
        label: Label,
        offset: usize,
        fallthrough: Option<i32>,
    ) -> Result<(Vec<usize>, Option<i32>), InternalError> {
        let state = self.state(label)?;
        if state.offset.is_some() {
            return Err(InternalError::LabelRebound(label.0));
        }
        if let Some(depth) = fallthrough {
            merge_depth(label, &mut state.depth, depth)?;
        }
        state.offset = Some(offset);
        Ok((std::mem::take(&mut state.pending), state.depth))
    }

    /// Fail on the first label that has jumps but no position.
    pub fn check_all_bound(&self) -> Result<(), InternalError> {
        match self
            .labels
            .iter()
            .position(|state| state.offset.is_none() && !state.pending.is_empty())
        {
            Some(index) => Err(InternalError::UnboundLabel(index as u32)),
            None => Ok(()),
        }
    }
}

fn merge_depth(label: Label, expected: &mut Option<i32>, found: i32) -> Result<(), InternalError> {
    match *expected {
        Some(expected) if expected != found => Err(InternalError::StackMismatch {
            label: label.0,
            expected,
            found,
        }),
        Some(_) => Ok(()),
        None => {
            *expected = Some(found);
            Ok(())
        }
    }
}
