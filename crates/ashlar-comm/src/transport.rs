//! The transport seam and the in-process channel backend.
//!
//! Messages own their payload buffers and transfer ownership to the
//! recipient; buffers are moved, never shared. The [`Transport`] trait
//! is the boundary to the real message-passing system; an MPI-backed
//! implementation would live outside this workspace and plug in here.

use crate::error::CommError;
use crate::neighbor::Face;
use ashlar_core::{BlockId, Real};
use indexmap::IndexMap;
use log::trace;

/// What a boundary message carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Ghost-zone data for a neighbor's boundary cells.
    Ghost,
    /// Conservation-correction terms for a coarse/fine face.
    FluxCorrection,
}

/// One boundary payload in flight between two blocks.
///
/// `face` names the *receiver's* face: the side of the receiving block
/// the data applies to. Senders construct it as the opposite of their
/// own outgoing face.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundaryMessage {
    /// Sending block.
    pub from: BlockId,
    /// Receiving block.
    pub to: BlockId,
    /// Label of the variable the payload belongs to.
    pub label: String,
    /// The receiver's face this payload applies to.
    pub face: Face,
    /// Ghost data or flux correction.
    pub kind: MessageKind,
    /// The payload, in the sender's slab ordering.
    pub data: Vec<Real>,
}

/// Non-blocking message transport between blocks.
///
/// `send` must return once issuance completes, without waiting for
/// delivery; `try_recv` must never block. Implementations are free to
/// reorder messages between distinct (variable, face) pairs.
pub trait Transport: Send {
    /// Issue a message to its destination. Never blocks.
    fn send(&self, msg: BoundaryMessage) -> Result<(), CommError>;

    /// Poll for one arrived message. Never blocks; `None` means nothing
    /// has arrived yet.
    fn try_recv(&self) -> Option<BoundaryMessage>;
}

/// In-process transport over unbounded crossbeam channels.
///
/// Each block owns one inbox; peers hold cloned senders into it. Used
/// for single-process runs and throughout the test suites.
pub struct ChannelTransport {
    id: BlockId,
    inbox: crossbeam_channel::Receiver<BoundaryMessage>,
    peers: IndexMap<BlockId, crossbeam_channel::Sender<BoundaryMessage>>,
}

impl ChannelTransport {
    /// Wire a fully-connected transport for the given block ids, one
    /// endpoint per block, in input order.
    pub fn mesh(ids: &[BlockId]) -> Vec<ChannelTransport> {
        let endpoints: Vec<_> = ids
            .iter()
            .map(|&id| {
                let (tx, rx) = crossbeam_channel::unbounded();
                (id, tx, rx)
            })
            .collect();

        endpoints
            .iter()
            .map(|(id, _, rx)| {
                let peers = endpoints
                    .iter()
                    .filter(|(other, _, _)| other != id)
                    .map(|(other, tx, _)| (*other, tx.clone()))
                    .collect();
                ChannelTransport {
                    id: *id,
                    inbox: rx.clone(),
                    peers,
                }
            })
            .collect()
    }

    /// Wire two blocks to each other.
    pub fn pair(a: BlockId, b: BlockId) -> (ChannelTransport, ChannelTransport) {
        let (tx_a, rx_a) = crossbeam_channel::unbounded();
        let (tx_b, rx_b) = crossbeam_channel::unbounded();
        (
            ChannelTransport {
                id: a,
                inbox: rx_a,
                peers: [(b, tx_b)].into_iter().collect(),
            },
            ChannelTransport {
                id: b,
                inbox: rx_b,
                peers: [(a, tx_a)].into_iter().collect(),
            },
        )
    }

    /// The block this endpoint belongs to.
    pub fn id(&self) -> BlockId {
        self.id
    }
}

impl Transport for ChannelTransport {
    fn send(&self, msg: BoundaryMessage) -> Result<(), CommError> {
        let to = msg.to;
        let tx = self
            .peers
            .get(&to)
            .ok_or(CommError::UnknownPeer { to })?;
        trace!(
            "block {}: send {:?} '{}' {} -> block {}",
            self.id,
            msg.kind,
            msg.label,
            msg.face,
            to
        );
        tx.send(msg).map_err(|_| CommError::Disconnected { to })
    }

    fn try_recv(&self) -> Option<BoundaryMessage> {
        let msg = self.inbox.try_recv().ok()?;
        trace!(
            "block {}: recv {:?} '{}' {} from block {}",
            self.id,
            msg.kind,
            msg.label,
            msg.face,
            msg.from
        );
        Some(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ghost(from: BlockId, to: BlockId, label: &str) -> BoundaryMessage {
        BoundaryMessage {
            from,
            to,
            label: label.into(),
            face: Face::lower(0),
            kind: MessageKind::Ghost,
            data: vec![1.0, 2.0],
        }
    }

    #[test]
    fn pair_delivers_both_ways() {
        let (a, b) = ChannelTransport::pair(BlockId(0), BlockId(1));

        a.send(ghost(BlockId(0), BlockId(1), "rho")).unwrap();
        b.send(ghost(BlockId(1), BlockId(0), "rho")).unwrap();

        let at_b = b.try_recv().unwrap();
        assert_eq!(at_b.from, BlockId(0));
        let at_a = a.try_recv().unwrap();
        assert_eq!(at_a.from, BlockId(1));
    }

    #[test]
    fn try_recv_is_non_blocking() {
        let (a, _b) = ChannelTransport::pair(BlockId(0), BlockId(1));
        assert!(a.try_recv().is_none());
    }

    #[test]
    fn unknown_peer_is_an_error() {
        let (a, _b) = ChannelTransport::pair(BlockId(0), BlockId(1));
        let err = a.send(ghost(BlockId(0), BlockId(9), "rho")).unwrap_err();
        assert_eq!(err, CommError::UnknownPeer { to: BlockId(9) });
    }

    #[test]
    fn mesh_connects_all_pairs() {
        let ids = [BlockId(0), BlockId(1), BlockId(2)];
        let transports = ChannelTransport::mesh(&ids);
        assert_eq!(transports.len(), 3);

        transports[0]
            .send(ghost(BlockId(0), BlockId(2), "rho"))
            .unwrap();
        let got = transports[2].try_recv().unwrap();
        assert_eq!(got.from, BlockId(0));
    }

    #[test]
    fn messages_from_one_sender_arrive_in_order() {
        let (a, b) = ChannelTransport::pair(BlockId(0), BlockId(1));
        for v in 0..4 {
            let mut msg = ghost(BlockId(0), BlockId(1), "rho");
            msg.data = vec![v as Real];
            a.send(msg).unwrap();
        }
        for v in 0..4 {
            assert_eq!(b.try_recv().unwrap().data, vec![v as Real]);
        }
    }
}
