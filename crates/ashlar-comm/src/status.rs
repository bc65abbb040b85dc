//! Completion status returned by every boundary task operation.

/// Tri-state completion status consumed as a node result in the outer
/// per-cycle task graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskStatus {
    /// The operation finished; the scheduler may run dependents.
    Complete,
    /// Not ready yet; the scheduler should poll again this cycle.
    Incomplete,
    /// The operation failed; the scheduler decides whether the failure
    /// aborts the run or is scoped to one block.
    Fail,
}

impl TaskStatus {
    /// `Complete` if the condition holds, `Incomplete` otherwise.
    pub fn complete_if(condition: bool) -> Self {
        if condition {
            Self::Complete
        } else {
            Self::Incomplete
        }
    }
}
