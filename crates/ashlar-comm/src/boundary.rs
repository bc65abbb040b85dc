//! Per-cycle receive-side state: arm, record, complete, clear.

use crate::transport::BoundaryMessage;
use ashlar_core::{BlockId, Real};
use indexmap::{IndexMap, IndexSet};

use crate::neighbor::Face;

/// Named subset of fields exchanged in one communication cycle.
///
/// `Interior` restricts the exchange to the independent state variables
/// (used during startup, before derived fields exist); `All` exchanges
/// every ghost-filling variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommPhase {
    /// Every ghost-filling variable.
    All,
    /// Independent state variables only.
    Interior,
}

/// Identifies one expected arrival within a cycle: which neighbor, which
/// variable, and which of the receiver's faces it applies to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MessageKey {
    /// The sending block.
    pub from: BlockId,
    /// Variable label.
    pub label: String,
    /// The receiver's face the payload applies to.
    pub face: Face,
}

impl MessageKey {
    fn of(msg: &BoundaryMessage) -> Self {
        Self {
            from: msg.from,
            label: msg.label.clone(),
            face: msg.face,
        }
    }
}

/// Receive-side state machine for one message kind on one block.
///
/// A cycle runs arm ([`start`](Self::start)) → record arrivals
/// ([`record`](Self::record)) → [`completed`](Self::completed) →
/// drain and apply → [`clear`](Self::clear). Arming is idempotent
/// within a cycle: calling `start` again with the same phase leaves
/// recorded arrivals intact, so early messages that raced ahead of the
/// scheduler are not dropped.
#[derive(Debug, Default)]
pub struct BoundaryData {
    phase: Option<CommPhase>,
    expected: IndexSet<MessageKey>,
    arrived: IndexMap<MessageKey, Vec<Real>>,
}

impl BoundaryData {
    /// Create an unarmed state machine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a cycle: set the phase and the expected-arrival set.
    ///
    /// Re-arming with the phase already active is a no-op. Arming with a
    /// different phase replaces the expectation set and discards stale
    /// arrivals from the previous phase.
    pub fn start<I>(&mut self, phase: CommPhase, expected: I)
    where
        I: IntoIterator<Item = MessageKey>,
    {
        if self.phase == Some(phase) {
            return;
        }
        self.phase = Some(phase);
        self.expected = expected.into_iter().collect();
        let expected = &self.expected;
        self.arrived.retain(|key, _| expected.contains(key));
    }

    /// Whether a cycle is currently armed.
    pub fn is_armed(&self) -> bool {
        self.phase.is_some()
    }

    /// The phase of the current cycle, if armed.
    pub fn phase(&self) -> Option<CommPhase> {
        self.phase
    }

    /// Record an arrived message. Unexpected arrivals are kept too: a
    /// message can legitimately land before the cycle that wants it is
    /// armed with a matching expectation.
    pub fn record(&mut self, msg: BoundaryMessage) {
        self.arrived.insert(MessageKey::of(&msg), msg.data);
    }

    /// Whether every expected arrival has landed. `false` while unarmed.
    pub fn completed(&self) -> bool {
        self.is_armed() && self.expected.iter().all(|k| self.arrived.contains_key(k))
    }

    /// Number of arrivals still outstanding.
    pub fn outstanding(&self) -> usize {
        self.expected
            .iter()
            .filter(|k| !self.arrived.contains_key(*k))
            .count()
    }

    /// Take all recorded arrivals for application into local storage.
    pub fn drain(&mut self) -> Vec<(MessageKey, Vec<Real>)> {
        self.arrived.drain(..).collect()
    }

    /// Release per-cycle transient state, making the machine ready for
    /// the next cycle.
    pub fn clear(&mut self) {
        self.phase = None;
        self.expected.clear();
        self.arrived.clear();
    }
}
