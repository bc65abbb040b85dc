//! Boundary-exchange and flux-correction tasks on [`MeshBlockData`].
//!
//! Every operation returns [`TaskStatus`] and is invoked once per
//! scheduling cycle by an outer scheduler. Participating variables are
//! the allocated cell variables with `FillGhost`; `Interior` phases
//! further restrict to `Independent` variables. Failures surface as
//! [`TaskStatus::Fail`] with a log diagnostic; transport errors are not
//! retried internally.

use crate::container::MeshBlockData;
use crate::variable::Variable;
use ashlar_comm::{
    BoundaryData, BoundaryMessage, CommPhase, Face, MessageKey, MessageKind, Neighbor,
    NeighborLevel, TaskStatus, Transport,
};
use ashlar_core::{ContainerError, MetadataFlag, Real};
use ashlar_mesh::{IndexDomain, IndexRange, IndexShape};
use log::{debug, warn};

/// Persistent communication state bound to one container: neighbor
/// topology, the transport endpoint, and the receive-side state machines
/// for each message kind.
pub(crate) struct BoundaryComm {
    neighbors: Vec<Neighbor>,
    transport: Box<dyn Transport>,
    ghost: BoundaryData,
    flux: BoundaryData,
    ghost_vars: Vec<String>,
    flux_vars: Vec<String>,
}

impl MeshBlockData {
    /// Bind the neighbor topology and transport endpoint. Called once
    /// per topology change, before any other boundary operation.
    pub fn setup_persistent_comms(
        &mut self,
        neighbors: Vec<Neighbor>,
        transport: impl Transport + 'static,
    ) -> TaskStatus {
        self.comm = Some(BoundaryComm {
            neighbors,
            transport: Box::new(transport),
            ghost: BoundaryData::new(),
            flux: BoundaryData::new(),
            ghost_vars: Vec::new(),
            flux_vars: Vec::new(),
        });
        self.reset_boundary_variables()
    }

    /// Rebuild the lists of boundary-participating variables from the
    /// current registry. Runs automatically on registry mutation.
    pub fn reset_boundary_variables(&mut self) -> TaskStatus {
        if self.comm.is_none() {
            warn!("reset_boundary_variables before setup_persistent_comms");
            return TaskStatus::Fail;
        }
        self.refresh_comm_vars();
        TaskStatus::Complete
    }

    pub(crate) fn refresh_comm_vars(&mut self) {
        let Some(comm) = self.comm.as_mut() else {
            return;
        };
        comm.ghost_vars.clear();
        comm.flux_vars.clear();
        for (label, var) in &self.vars {
            if var.metadata().fills_ghost() {
                comm.ghost_vars.push(label.clone());
            }
            if var.metadata().has_fluxes() {
                comm.flux_vars.push(label.clone());
            }
        }
    }

    fn in_phase(var: &Variable, phase: CommPhase) -> bool {
        match phase {
            CommPhase::All => true,
            CommPhase::Interior => var.metadata().is_set(MetadataFlag::Independent),
        }
    }

    /// Arm the receive-side state for one cycle: the set of expected
    /// ghost arrivals (one per neighbor per participating variable) and
    /// the expected flux corrections from finer neighbors. Idempotent
    /// within a cycle; must precede the cycle's receive polls.
    pub fn start_receiving(&mut self, phase: CommPhase) -> TaskStatus {
        let Some(comm) = self.comm.as_ref() else {
            warn!("start_receiving before setup_persistent_comms");
            return TaskStatus::Fail;
        };

        let mut ghost_expected = Vec::new();
        for n in &comm.neighbors {
            for label in &comm.ghost_vars {
                let Some(var) = self.vars.get(label) else {
                    continue;
                };
                if !Self::in_phase(var, phase) || !var.is_allocated() {
                    continue;
                }
                ghost_expected.push(MessageKey {
                    from: n.block,
                    label: label.clone(),
                    face: n.face,
                });
            }
        }

        let mut flux_expected = Vec::new();
        for n in &comm.neighbors {
            if n.level != NeighborLevel::Finer {
                continue;
            }
            for label in &comm.flux_vars {
                let Some(var) = self.vars.get(label) else {
                    continue;
                };
                if !var.is_allocated() {
                    continue;
                }
                flux_expected.push(MessageKey {
                    from: n.block,
                    label: label.clone(),
                    face: n.face,
                });
            }
        }

        if let Some(comm) = self.comm.as_mut() {
            comm.ghost.start(phase, ghost_expected);
            comm.flux.start(phase, flux_expected);
        }
        TaskStatus::Complete
    }

    /// Pack each participating variable's ghost-adjacent interior slab
    /// per neighbor face and issue non-blocking sends. `Complete` once
    /// issuance finishes.
    pub fn send_boundary_buffers(&mut self) -> TaskStatus {
        let my_id = match self.block() {
            Ok(b) => b.id(),
            Err(e) => {
                warn!("send_boundary_buffers: {e}");
                return TaskStatus::Fail;
            }
        };
        let Some(comm) = self.comm.as_ref() else {
            warn!("send_boundary_buffers before setup_persistent_comms");
            return TaskStatus::Fail;
        };
        let phase = comm.ghost.phase().unwrap_or(CommPhase::All);

        for n in &comm.neighbors {
            for label in &comm.ghost_vars {
                let Some(var) = self.vars.get(label) else {
                    continue;
                };
                if !Self::in_phase(var, phase) || !var.is_allocated() {
                    continue;
                }
                let Some(ranges) = send_ranges(var.shape(), n.face) else {
                    warn!(
                        "block {my_id}: neighbor face {} lies in an inactive dimension, \
                         cannot pack '{label}'",
                        n.face
                    );
                    return TaskStatus::Fail;
                };
                let data = match extract(var, &ranges) {
                    Ok(data) => data,
                    Err(e) => {
                        warn!("block {my_id}: pack '{label}' for send failed: {e}");
                        return TaskStatus::Fail;
                    }
                };
                let msg = BoundaryMessage {
                    from: my_id,
                    to: n.block,
                    label: label.clone(),
                    face: n.face.opposite(),
                    kind: MessageKind::Ghost,
                    data,
                };
                if let Err(e) = comm.transport.send(msg) {
                    warn!("block {my_id}: send '{label}' failed: {e}");
                    return TaskStatus::Fail;
                }
            }
        }
        TaskStatus::Complete
    }

    fn pump(comm: &mut BoundaryComm) {
        while let Some(msg) = comm.transport.try_recv() {
            match msg.kind {
                MessageKind::Ghost => comm.ghost.record(msg),
                MessageKind::FluxCorrection => comm.flux.record(msg),
            }
        }
    }

    /// Drain the transport without blocking. `Incomplete` until every
    /// expected ghost message has landed, then `Complete`. Safe to call
    /// repeatedly within a cycle.
    pub fn receive_boundary_buffers(&mut self) -> TaskStatus {
        let Some(comm) = self.comm.as_mut() else {
            warn!("receive_boundary_buffers before setup_persistent_comms");
            return TaskStatus::Fail;
        };
        if !comm.ghost.is_armed() {
            warn!("receive_boundary_buffers before start_receiving");
            return TaskStatus::Fail;
        }
        Self::pump(comm);
        TaskStatus::complete_if(comm.ghost.completed())
    }

    /// Apply received ghost slabs into local ghost storage.
    pub fn set_boundaries(&mut self) -> TaskStatus {
        let arrived = match self.comm.as_mut() {
            Some(comm) => comm.ghost.drain(),
            None => {
                warn!("set_boundaries before setup_persistent_comms");
                return TaskStatus::Fail;
            }
        };
        for (key, payload) in arrived {
            let Some(var) = self.vars.get(&key.label) else {
                debug!("dropping arrival for unregistered '{}'", key.label);
                continue;
            };
            let Some(ranges) = ghost_ranges(var.shape(), key.face) else {
                warn!(
                    "set_boundaries: face {} of '{}' lies in an inactive dimension",
                    key.face, key.label
                );
                return TaskStatus::Fail;
            };
            if let Err(e) = apply(var, &ranges, &payload) {
                warn!("set_boundaries: apply '{}' at {} failed: {e}", key.label, key.face);
                return TaskStatus::Fail;
            }
        }
        TaskStatus::Complete
    }

    /// Poll until every expected ghost message has landed, then apply.
    /// The blocking composition of
    /// [`receive_boundary_buffers`](Self::receive_boundary_buffers) and
    /// [`set_boundaries`](Self::set_boundaries).
    pub fn receive_and_set_boundaries_with_wait(&mut self) -> TaskStatus {
        loop {
            match self.receive_boundary_buffers() {
                TaskStatus::Complete => break,
                TaskStatus::Fail => return TaskStatus::Fail,
                TaskStatus::Incomplete => std::thread::yield_now(),
            }
        }
        self.set_boundaries()
    }

    /// Release per-cycle transient state for both message kinds, making
    /// the state machines ready for the next cycle.
    pub fn clear_boundary(&mut self, phase: CommPhase) -> TaskStatus {
        let Some(comm) = self.comm.as_mut() else {
            warn!("clear_boundary before setup_persistent_comms");
            return TaskStatus::Fail;
        };
        debug!("clearing boundary state after {phase:?} cycle");
        comm.ghost.clear();
        comm.flux.clear();
        TaskStatus::Complete
    }

    /// Restrict this block's face fluxes (ratio-2 averaging) on each
    /// face shared with a coarser neighbor and issue the corrections.
    pub fn send_flux_correction(&mut self) -> TaskStatus {
        let my_id = match self.block() {
            Ok(b) => b.id(),
            Err(e) => {
                warn!("send_flux_correction: {e}");
                return TaskStatus::Fail;
            }
        };
        let Some(comm) = self.comm.as_ref() else {
            warn!("send_flux_correction before setup_persistent_comms");
            return TaskStatus::Fail;
        };

        for n in &comm.neighbors {
            if n.level != NeighborLevel::Coarser {
                continue;
            }
            for label in &comm.flux_vars {
                let Some(var) = self.vars.get(label) else {
                    continue;
                };
                if !var.is_allocated() {
                    continue;
                }
                let data = match restrict_flux(var, n.face) {
                    Ok(data) => data,
                    Err(e) => {
                        warn!("block {my_id}: restrict '{label}' failed: {e}");
                        return TaskStatus::Fail;
                    }
                };
                let msg = BoundaryMessage {
                    from: my_id,
                    to: n.block,
                    label: label.clone(),
                    face: n.face.opposite(),
                    kind: MessageKind::FluxCorrection,
                    data,
                };
                if let Err(e) = comm.transport.send(msg) {
                    warn!("block {my_id}: send flux '{label}' failed: {e}");
                    return TaskStatus::Fail;
                }
            }
        }
        TaskStatus::Complete
    }

    /// Drain the transport and, once every expected correction from
    /// finer neighbors has landed, overwrite the local flux slabs with
    /// the received values. `Incomplete` while corrections are
    /// outstanding.
    pub fn receive_flux_correction(&mut self) -> TaskStatus {
        let arrived = {
            let Some(comm) = self.comm.as_mut() else {
                warn!("receive_flux_correction before setup_persistent_comms");
                return TaskStatus::Fail;
            };
            if !comm.flux.is_armed() {
                warn!("receive_flux_correction before start_receiving");
                return TaskStatus::Fail;
            }
            Self::pump(comm);
            if !comm.flux.completed() {
                return TaskStatus::Incomplete;
            }
            comm.flux.drain()
        };
        for (key, payload) in arrived {
            let Some(var) = self.vars.get(&key.label) else {
                debug!("dropping flux correction for unregistered '{}'", key.label);
                continue;
            };
            if let Err(e) = apply_flux_correction(var, key.face, &payload) {
                warn!(
                    "receive_flux_correction: apply '{}' at {} failed: {e}",
                    key.label, key.face
                );
                return TaskStatus::Fail;
            }
        }
        TaskStatus::Complete
    }
}

fn interior_ranges(shape: &IndexShape) -> [IndexRange; 3] {
    [
        shape.bounds(0, IndexDomain::Interior),
        shape.bounds(1, IndexDomain::Interior),
        shape.bounds(2, IndexDomain::Interior),
    ]
}

/// The ghost-adjacent interior slab sent out through `face`: `nghost`
/// layers of interior cells against the face, interior extent in the
/// transverse dimensions. `None` when `face` lies in an inactive
/// dimension, which carries no ghost layers.
fn send_ranges(shape: &IndexShape, face: Face) -> Option<[IndexRange; 3]> {
    if !shape.is_active(face.dir) {
        return None;
    }
    let g = shape.nghost();
    let mut ranges = interior_ranges(shape);
    let int = ranges[face.dir];
    ranges[face.dir] = if face.upper {
        IndexRange {
            s: int.e + 1 - g,
            e: int.e,
        }
    } else {
        IndexRange {
            s: int.s,
            e: int.s + g - 1,
        }
    };
    Some(ranges)
}

/// The ghost slab behind `face` that an arriving payload fills. `None`
/// when `face` lies in an inactive dimension.
fn ghost_ranges(shape: &IndexShape, face: Face) -> Option<[IndexRange; 3]> {
    if !shape.is_active(face.dir) {
        return None;
    }
    let g = shape.nghost();
    let mut ranges = interior_ranges(shape);
    let int = ranges[face.dir];
    ranges[face.dir] = if face.upper {
        IndexRange {
            s: int.e + 1,
            e: int.e + g,
        }
    } else {
        IndexRange {
            s: int.s - g,
            e: int.s - 1,
        }
    };
    Some(ranges)
}

fn slab_len(ranges: &[IndexRange; 3]) -> usize {
    ranges.iter().map(IndexRange::len).product()
}

/// Copy a slab out of a variable's fine buffer, components outermost,
/// then ascending k, j, i.
fn extract(var: &Variable, ranges: &[IndexRange; 3]) -> Result<Vec<Real>, ContainerError> {
    let shape = *var.shape();
    let data = var.read()?;
    let stride = shape.ncells(IndexDomain::Entire);
    let mut out = Vec::with_capacity(var.metadata().components() * slab_len(ranges));
    for c in 0..var.metadata().components() {
        let base = c * stride;
        for k in ranges[2].iter() {
            for j in ranges[1].iter() {
                for i in ranges[0].iter() {
                    out.push(data[base + shape.cell_index(i, j, k)]);
                }
            }
        }
    }
    Ok(out)
}

/// Copy a payload into a slab of a variable's fine buffer, in the same
/// ordering [`extract`] produces.
fn apply(var: &Variable, ranges: &[IndexRange; 3], payload: &[Real]) -> Result<(), ContainerError> {
    let shape = *var.shape();
    let expected = var.metadata().components() * slab_len(ranges);
    if payload.len() != expected {
        return Err(ContainerError::InvalidOperation {
            label: var.label(),
            reason: format!(
                "payload length {} does not match slab length {expected}",
                payload.len()
            ),
        });
    }
    let stride = shape.ncells(IndexDomain::Entire);
    let mut data = var.write()?;
    let mut cursor = 0;
    for c in 0..var.metadata().components() {
        let base = c * stride;
        for k in ranges[2].iter() {
            for j in ranges[1].iter() {
                for i in ranges[0].iter() {
                    data[base + shape.cell_index(i, j, k)] = payload[cursor];
                    cursor += 1;
                }
            }
        }
    }
    Ok(())
}

fn transverse(dir: usize) -> [usize; 2] {
    match dir {
        0 => [1, 2],
        1 => [0, 2],
        _ => [0, 1],
    }
}

/// The storage index along `face.dir` of the flux layer sitting on
/// `face`.
fn flux_layer(shape: &IndexShape, face: Face) -> usize {
    let int = shape.bounds(face.dir, IndexDomain::Interior);
    if face.upper {
        int.e + 1
    } else {
        int.s
    }
}

/// Restrict the flux layer on `face` by ratio-2 averaging over the
/// active transverse dimensions: each coarse face value is the mean of
/// the 1, 2, or 4 fine values it covers.
fn restrict_flux(var: &Variable, face: Face) -> Result<Vec<Real>, ContainerError> {
    let shape = *var.shape();
    let d = face.dir;
    let flux = var.flux_read(d)?;
    let layer = flux_layer(&shape, face);
    let t = transverse(d);

    let coarse_len = |dim: usize| {
        if shape.is_active(dim) {
            shape.interior_len(dim) / 2
        } else {
            1
        }
    };
    let step = |dim: usize| if shape.is_active(dim) { 2 } else { 1 };
    let start = |dim: usize| shape.bounds(dim, IndexDomain::Interior).s;

    let (n0, n1) = (coarse_len(t[0]), coarse_len(t[1]));
    let mut out = Vec::with_capacity(var.metadata().components() * n0 * n1);
    for c in 0..var.metadata().components() {
        let base = c * shape.face_ncells(d);
        for c1 in 0..n1 {
            for c0 in 0..n0 {
                let mut sum = 0.0;
                let mut count = 0;
                for o1 in 0..step(t[1]) {
                    for o0 in 0..step(t[0]) {
                        let mut idx = [0usize; 3];
                        idx[d] = layer;
                        idx[t[0]] = start(t[0]) + step(t[0]) * c0 + o0;
                        idx[t[1]] = start(t[1]) + step(t[1]) * c1 + o1;
                        sum += flux[base + shape.face_index(d, idx[0], idx[1], idx[2])];
                        count += 1;
                    }
                }
                out.push(sum / count as Real);
            }
        }
    }
    Ok(out)
}

/// Overwrite the flux layer on `face` with a restricted correction from
/// the finer side. The payload must cover the layer's interior
/// transverse extent exactly.
fn apply_flux_correction(
    var: &Variable,
    face: Face,
    payload: &[Real],
) -> Result<(), ContainerError> {
    let shape = *var.shape();
    let d = face.dir;
    let layer = flux_layer(&shape, face);
    let t = transverse(d);
    let (r0, r1) = (
        shape.bounds(t[0], IndexDomain::Interior),
        shape.bounds(t[1], IndexDomain::Interior),
    );

    let expected = var.metadata().components() * r0.len() * r1.len();
    if payload.len() != expected {
        return Err(ContainerError::InvalidOperation {
            label: var.label(),
            reason: format!(
                "flux correction length {} does not match face extent {expected}",
                payload.len()
            ),
        });
    }

    let mut flux = var.flux_write(d)?;
    let mut cursor = 0;
    for c in 0..var.metadata().components() {
        let base = c * shape.face_ncells(d);
        for j1 in r1.iter() {
            for j0 in r0.iter() {
                let mut idx = [0usize; 3];
                idx[d] = layer;
                idx[t[0]] = j0;
                idx[t[1]] = j1;
                flux[base + shape.face_index(d, idx[0], idx[1], idx[2])] = payload[cursor];
                cursor += 1;
            }
        }
    }
    Ok(())
}
