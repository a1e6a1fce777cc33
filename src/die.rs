//! Die geometry and the simulated "current face" used by face-dependent animations.

use std::cell::{Cell, RefCell};
use std::time::{Duration, Instant};

use rand::prelude::*;
use serde::{Deserialize, Serialize};

/// Capacity callers must give LED output buffers. LED masks are 32 bits wide.
pub const MAX_LED_COUNT: usize = 32;

/// Minimum time between two re-rolls of a [`VirtualDie`].
pub const REROLL_INTERVAL: Duration = Duration::from_secs(5);

/// Physical die shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DieType {
    D4,
    D6,
    D6Pipped,
    D6Fudge,
    D8,
    D10,
    D00,
    D12,
    #[default]
    D20,
}

impl DieType {
    /// Number of individually addressable LEDs.
    pub fn led_count(self) -> usize {
        match self {
            DieType::D4 => 4,
            DieType::D6 | DieType::D6Fudge => 6,
            DieType::D6Pipped => 21,
            DieType::D8 => 8,
            DieType::D10 | DieType::D00 => 10,
            DieType::D12 => 12,
            DieType::D20 => 20,
        }
    }

    /// Number of faces.
    pub fn face_count(self) -> usize {
        match self {
            DieType::D4 => 4,
            DieType::D6 | DieType::D6Pipped | DieType::D6Fudge => 6,
            DieType::D8 => 8,
            DieType::D10 | DieType::D00 => 10,
            DieType::D12 => 12,
            DieType::D20 => 20,
        }
    }

    /// Index of the face with the highest value.
    pub fn top_face(self) -> usize {
        self.face_count() - 1
    }
}

/// What an animation needs to know about the die it plays on.
///
/// Implemented by [`VirtualDie`] for local preview; a connected die can
/// implement it from its telemetry so face-dependent animations behave the
/// same either way.
pub trait DieState {
    fn led_count(&self) -> usize;
    fn face_count(&self) -> usize;
    /// Face currently pointing up, in `[0, face_count)`.
    fn current_face(&self) -> usize;
}

#[derive(Debug)]
enum FaceSource {
    Pinned(usize),
    Rolling {
        rng: RefCell<StdRng>,
        face: Cell<usize>,
        last_roll: Cell<Option<Instant>>,
    },
}

/// Headless stand-in for a physical die.
#[derive(Debug)]
pub struct VirtualDie {
    die_type: DieType,
    face: FaceSource,
}

impl VirtualDie {
    /// Die whose face is re-rolled at most once per [`REROLL_INTERVAL`].
    pub fn new(die_type: DieType) -> Self {
        Self::with_rng(die_type, StdRng::from_entropy())
    }

    /// Rolling die with a deterministic sequence of faces.
    pub fn seeded(die_type: DieType, seed: u64) -> Self {
        Self::with_rng(die_type, StdRng::seed_from_u64(seed))
    }

    fn with_rng(die_type: DieType, rng: StdRng) -> Self {
        Self {
            die_type,
            face: FaceSource::Rolling {
                rng: RefCell::new(rng),
                face: Cell::new(die_type.top_face()),
                last_roll: Cell::new(None),
            },
        }
    }

    /// Die that always reports `face` (clamped to the die's faces).
    pub fn pinned(die_type: DieType, face: usize) -> Self {
        Self {
            die_type,
            face: FaceSource::Pinned(face.min(die_type.top_face())),
        }
    }

    pub fn die_type(&self) -> DieType {
        self.die_type
    }

    pub fn top_face(&self) -> usize {
        self.die_type.top_face()
    }

    /// Current face as seen at instant `now`, re-rolling if the last roll is
    /// older than [`REROLL_INTERVAL`].
    pub fn face_at(&self, now: Instant) -> usize {
        match &self.face {
            FaceSource::Pinned(face) => *face,
            FaceSource::Rolling {
                rng,
                face,
                last_roll,
            } => {
                let due = match last_roll.get() {
                    None => true,
                    Some(t) => now.saturating_duration_since(t) >= REROLL_INTERVAL,
                };
                if due {
                    let rolled = rng.borrow_mut().gen_range(0..self.die_type.face_count());
                    log::trace!("virtual {:?} rolled face {}", self.die_type, rolled);
                    face.set(rolled);
                    last_roll.set(Some(now));
                }
                face.get()
            }
        }
    }
}

impl DieState for VirtualDie {
    fn led_count(&self) -> usize {
        self.die_type.led_count()
    }

    fn face_count(&self) -> usize {
        self.die_type.face_count()
    }

    fn current_face(&self) -> usize {
        self.face_at(Instant::now())
    }
}
