/// Outcome of a slot request.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SlotGrant {
    /// `true` when a non-overlapping range was reserved.
    pub reserved: bool,
    /// Vertical offset inside the band. A fallback offset when nothing was reserved.
    pub y: f64,
}

#[derive(Clone, Copy, Debug)]
struct Reservation {
    id: u32,
    y: f64,
    height: f64,
    seq: u64,
}

impl Reservation {
    fn end(&self) -> f64 {
        self.y + self.height
    }
}

/// First-fit vertical range allocator for one layer.
///
/// Reservations are kept sorted by offset and never overlap. The band height may change at
/// any time; reservations that now extend past it stay until released.
#[derive(Clone, Debug, Default)]
pub struct SlotAllocator {
    band: f64,
    reservations: Vec<Reservation>,
    next_seq: u64,
}

impl SlotAllocator {
    /// Allocator for a band of `band` px.
    pub fn new(band: f64) -> Self {
        Self {
            band: band.max(0.0),
            ..Self::default()
        }
    }

    /// Current band height, px.
    pub fn band(&self) -> f64 {
        self.band
    }

    /// Number of outstanding reservations.
    pub fn len(&self) -> usize {
        self.reservations.len()
    }

    /// Return `true` when nothing is reserved.
    pub fn is_empty(&self) -> bool {
        self.reservations.is_empty()
    }

    /// Reserve `height` px for `id` at the lowest free offset.
    ///
    /// When no gap is large enough the grant is not reserved and `y` falls back to the offset
    /// of the oldest outstanding reservation, or `0` for an empty band.
    pub fn reserve(&mut self, id: u32, height: f64) -> SlotGrant {
        let height = height.max(0.0);
        let mut y = 0.0_f64;
        let mut insert_at = self.reservations.len();
        for (i, r) in self.reservations.iter().enumerate() {
            if y + height <= r.y {
                insert_at = i;
                break;
            }
            y = y.max(r.end());
        }

        if y + height > self.band {
            return SlotGrant {
                reserved: false,
                y: self.fallback_y(),
            };
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.reservations.insert(
            insert_at,
            Reservation {
                id,
                y,
                height,
                seq,
            },
        );
        SlotGrant { reserved: true, y }
    }

    /// Release the reservation made for `id` at `y`. Unknown grants are ignored.
    pub fn release(&mut self, id: u32, y: f64) -> bool {
        match self
            .reservations
            .iter()
            .position(|r| r.id == id && (r.y - y).abs() < 1e-6)
        {
            Some(i) => {
                self.reservations.remove(i);
                true
            }
            None => false,
        }
    }

    /// Change the band height; outstanding reservations are kept.
    pub fn resize(&mut self, band: f64) {
        self.band = band.max(0.0);
    }

    /// Drop every reservation.
    pub fn clear(&mut self) {
        self.reservations.clear();
    }

    fn fallback_y(&self) -> f64 {
        self.reservations
            .iter()
            .min_by_key(|r| r.seq)
            .map_or(0.0, |r| r.y)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layer/slot.rs"]
mod tests;
