//! Boundary-row exchange between adjacent bands.

use parking_lot::{Condvar, Mutex};

use crate::partition::padded_rows;
use crate::{Image, Rgb};

/// Latest published boundary rows of one worker, read by one neighbor.
///
/// Only the most recent value is kept; `publish` overwrites unconditionally.
/// Reads and writes hold the slot's lock for a single copy, so a reader never
/// observes a partially written row.
#[derive(Debug)]
pub struct HaloSlot {
    rows: Mutex<Vec<Rgb>>,
}

impl HaloSlot {
    pub fn new(rows: Vec<Rgb>) -> Self {
        Self {
            rows: Mutex::new(rows),
        }
    }

    pub fn publish(&self, rows: &[Rgb]) {
        let mut slot = self.rows.lock();
        debug_assert_eq!(slot.len(), rows.len(), "halo row size mismatch");
        slot.copy_from_slice(rows);
    }

    pub fn read_into(&self, dst: &mut [Rgb]) {
        let slot = self.rows.lock();
        dst.copy_from_slice(&slot);
    }

    pub fn len(&self) -> usize {
        self.rows.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The pair of slots shared by the bands above and below one boundary row.
#[derive(Debug)]
pub struct HaloLink {
    /// Upper worker's bottom rows, read into the lower worker's top halo.
    pub downward: HaloSlot,
    /// Lower worker's top rows, read into the upper worker's bottom halo.
    pub upward: HaloSlot,
}

impl HaloLink {
    /// Creates the link for the boundary just above image row `boundary`.
    ///
    /// Both slots start out holding the image rows on their side of the
    /// boundary, column-padded, so the first round on either side sees the
    /// exact neighborhood.
    pub fn new(image: &Image, boundary: usize, radius: usize) -> Self {
        assert!(
            boundary >= radius && boundary + radius <= image.height(),
            "boundary {} too close to the image edge for radius {}",
            boundary,
            radius
        );

        let width = image.width();
        let above = image.rows(boundary - radius..boundary);
        let below = image.rows(boundary..boundary + radius);

        Self {
            downward: HaloSlot::new(padded_rows(above, width, radius)),
            upward: HaloSlot::new(padded_rows(below, width, radius)),
        }
    }
}

/// Returned by [`RoundBarrier::wait`] once a participant has aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarrierAborted;

#[derive(Debug, Default)]
struct BarrierState {
    arrived: usize,
    generation: u64,
    aborted: bool,
}

/// Reusable barrier that keeps workers on the same round.
///
/// Unlike `std::sync::Barrier` it can be aborted, which releases every
/// waiter with an error instead of leaving it blocked on a dead peer.
#[derive(Debug)]
pub struct RoundBarrier {
    parties: usize,
    state: Mutex<BarrierState>,
    cvar: Condvar,
}

impl RoundBarrier {
    pub fn new(parties: usize) -> Self {
        assert!(parties > 0, "barrier needs at least one party");
        Self {
            parties,
            state: Mutex::new(BarrierState::default()),
            cvar: Condvar::new(),
        }
    }

    /// Blocks until all parties have called `wait` for the current round.
    pub fn wait(&self) -> Result<(), BarrierAborted> {
        let mut state = self.state.lock();
        if state.aborted {
            return Err(BarrierAborted);
        }

        let generation = state.generation;
        state.arrived += 1;
        if state.arrived == self.parties {
            state.arrived = 0;
            state.generation += 1;
            self.cvar.notify_all();
            return Ok(());
        }

        while state.generation == generation && !state.aborted {
            self.cvar.wait(&mut state);
        }

        if state.generation == generation {
            Err(BarrierAborted)
        } else {
            Ok(())
        }
    }

    /// Releases all current and future waiters with [`BarrierAborted`].
    pub fn abort(&self) {
        let mut state = self.state.lock();
        state.aborted = true;
        self.cvar.notify_all();
    }
}
