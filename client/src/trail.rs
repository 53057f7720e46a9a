//! Segment trail engine
//!
//! A snake body is a chain of segments. Each segment owns a small ring of
//! the last positions it was asked to adopt and only moves once that ring
//! has wrapped, so every segment replays its input `capacity` ticks late.
//! Feeding the value a segment drops into the next one turns a single
//! authoritative head position into a discretely spaced trailing body.

use shared::{Coord, SEGMENT_BUFFER_LENGTH};

/// Fixed-capacity ring of positions that hands back the slot it overwrites.
#[derive(Debug, Clone)]
pub struct PositionRing {
    slots: Box<[Option<Coord>]>,
    cursor: usize,
}

impl PositionRing {
    /// Creates an empty ring. A zero capacity is bumped to one slot.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity.max(1)].into_boxed_slice(),
            cursor: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Writes `coord` at the cursor and returns whatever that slot held before.
    ///
    /// Returns `None` until the ring has completed its first lap.
    pub fn push(&mut self, coord: Coord) -> Option<Coord> {
        let previous = self.slots[self.cursor].replace(coord);
        self.cursor = (self.cursor + 1) % self.slots.len();
        previous
    }
}

impl Default for PositionRing {
    fn default() -> Self {
        Self::with_capacity(SEGMENT_BUFFER_LENGTH)
    }
}

/// One trailing body unit.
#[derive(Debug, Clone, Default)]
pub struct Segment {
    ring: PositionRing,
    position: Coord,
}

impl Segment {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ring: PositionRing::with_capacity(capacity),
            position: Coord::default(),
        }
    }

    /// Current rendered position. Stays at the origin until the ring wraps.
    pub fn position(&self) -> Coord {
        self.position
    }

    /// Adopts the coordinate dropped out of the ring, if any, and returns it
    /// so the caller can feed it to the next segment.
    pub fn push_position(&mut self, coord: Coord) -> Option<Coord> {
        let dropped = self.ring.push(coord)?;
        self.position = dropped;
        Some(dropped)
    }
}

/// Ordered, append-only chain of segments behind one head.
#[derive(Debug, Clone)]
pub struct Trail {
    segments: Vec<Segment>,
    capacity: usize,
}

impl Trail {
    /// Starts with a single segment, like a freshly spawned player.
    pub fn new() -> Self {
        Self::with_capacity(SEGMENT_BUFFER_LENGTH)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            segments: vec![Segment::with_capacity(capacity)],
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Appends an empty segment and returns the new segment count.
    pub fn grow(&mut self) -> usize {
        self.segments.push(Segment::with_capacity(self.capacity));
        self.segments.len()
    }

    /// Pushes the previous head anchor down the chain.
    ///
    /// Each segment receives what its predecessor dropped; propagation stops
    /// at the first segment whose ring has not wrapped yet.
    pub fn propagate(&mut self, previous_anchor: Coord) {
        let mut carried = Some(previous_anchor);
        for segment in &mut self.segments {
            match carried {
                Some(coord) => carried = segment.push_position(coord),
                None => break,
            }
        }
    }

    pub fn positions(&self) -> Vec<Coord> {
        self.segments.iter().map(Segment::position).collect()
    }
}

impl Default for Trail {
    fn default() -> Self {
        Self::new()
    }
}
