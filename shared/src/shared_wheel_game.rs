use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{MAX_FULL_TURNS, MIN_FULL_TURNS, POINTER_ANGLE, SPIN_DURATION_MS, SPIN_FALLBACK_GRACE_MS};

/// Types of rewards a segment can carry
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Reward {
    Coins(u32),
    Message,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub label: &'static str,
    pub reward: Reward,
}

/// Wheel segments in drawing order, starting at angle 0.
pub const SEGMENTS: [Segment; 4] = [
    Segment { label: "Как дела?", reward: Reward::Message },
    Segment { label: "Привет!", reward: Reward::Message },
    Segment { label: "2 монеты", reward: Reward::Coins(2) },
    Segment {
        label: "Проверь директорию /secret/secret.html Вдруг там что-то интересное?",
        reward: Reward::Message,
    },
];

/// Index of the segment under the pointer once the wheel rests at `rotation`
/// degrees.
pub fn segment_at(rotation: f64, pointer_angle: f64, segment_count: usize) -> usize {
    if segment_count == 0 {
        return 0;
    }
    let normalized = rotation.rem_euclid(360.0);
    let at_pointer = (pointer_angle - normalized + 360.0).rem_euclid(360.0);
    let width = 360.0 / segment_count as f64;
    (at_pointer / width).floor() as usize % segment_count
}

/// Random target for one spin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpinPlan {
    pub full_turns: u32,
    pub final_offset: f64,
}

impl SpinPlan {
    pub fn roll<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            full_turns: rng.gen_range(MIN_FULL_TURNS..=MAX_FULL_TURNS),
            final_offset: rng.gen_range(0..360) as f64,
        }
    }

    pub fn target_rotation(&self) -> f64 {
        self.full_turns as f64 * 360.0 + self.final_offset
    }

    pub fn segment_index(&self) -> usize {
        segment_at(self.target_rotation(), POINTER_ANGLE, SEGMENTS.len())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpinId(pub u32);

/// Which signal ended the spin animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleVia {
    Completion,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveSpin {
    pub id: SpinId,
    pub plan: SpinPlan,
    resolved: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpinOutcome {
    pub id: SpinId,
    pub index: usize,
    pub segment: Segment,
    pub via: SettleVia,
}

/// Represents the current state of the wheel game. At most one spin is in
/// flight; the coin cost is charged by the caller before `start`.
#[derive(Debug, Clone, Default)]
pub struct WheelGame {
    next_id: u32,
    active: Option<ActiveSpin>,
    last_result: Option<SpinOutcome>,
}

impl WheelGame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_spinning(&self) -> bool {
        self.active.map_or(false, |spin| !spin.resolved)
    }

    pub fn last_result(&self) -> Option<&SpinOutcome> {
        self.last_result.as_ref()
    }

    /// Begins a spin, or returns `None` while another one is running.
    pub fn start<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<ActiveSpin> {
        if self.is_spinning() {
            return None;
        }
        self.next_id += 1;
        let spin = ActiveSpin {
            id: SpinId(self.next_id),
            plan: SpinPlan::roll(rng),
            resolved: false,
        };
        self.active = Some(spin);
        self.last_result = None;
        Some(spin)
    }

    /// Resolves the running spin. Only the first signal for the current spin
    /// yields an outcome; late or stale signals return `None`.
    pub fn settle(&mut self, id: SpinId, via: SettleVia) -> Option<SpinOutcome> {
        let spin = self.active.as_mut()?;
        if spin.id != id || spin.resolved {
            return None;
        }
        spin.resolved = true;
        let index = spin.plan.segment_index();
        let outcome = SpinOutcome {
            id,
            index,
            segment: SEGMENTS[index],
            via,
        };
        self.last_result = Some(outcome);
        Some(outcome)
    }
}

/// Delay after which the fallback timer settles a spin whose completion
/// notification never arrived.
pub const fn fallback_delay_ms() -> u32 {
    SPIN_DURATION_MS + SPIN_FALLBACK_GRACE_MS
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_segment_mapping() {
        assert_eq!(segment_at(0.0, 90.0, 4), 1);
        assert_eq!(segment_at(360.0 * 6.0, 90.0, 4), 1);
        assert_eq!(segment_at(90.0, 90.0, 4), 0);
        assert_eq!(segment_at(100.0, 90.0, 4), 3);
        assert_eq!(segment_at(270.0, 90.0, 4), 2);
        assert_eq!(segment_at(-90.0, 90.0, 4), 2);
    }

    #[test]
    fn test_spin_plan_ranges() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..500 {
            let plan = SpinPlan::roll(&mut rng);
            assert!((5..=8).contains(&plan.full_turns));
            assert!(plan.final_offset >= 0.0 && plan.final_offset < 360.0);
            assert!(plan.target_rotation() >= 1800.0 && plan.target_rotation() < 3240.0);
        }
    }

    #[test]
    fn test_settle_exactly_once() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut game = WheelGame::new();
        let spin = game.start(&mut rng).unwrap();
        assert!(game.is_spinning());
        assert!(game.start(&mut rng).is_none());

        let first = game.settle(spin.id, SettleVia::Fallback).unwrap();
        assert_eq!(first.index, spin.plan.segment_index());
        assert!(game.settle(spin.id, SettleVia::Completion).is_none());
        assert!(!game.is_spinning());
        assert_eq!(game.last_result().map(|r| r.via), Some(SettleVia::Fallback));
    }

    #[test]
    fn test_stale_signal_ignored() {
        let mut rng = StdRng::seed_from_u64(10);
        let mut game = WheelGame::new();
        let first = game.start(&mut rng).unwrap();
        game.settle(first.id, SettleVia::Completion).unwrap();
        let second = game.start(&mut rng).unwrap();
        assert!(game.settle(first.id, SettleVia::Fallback).is_none());
        assert!(game.is_spinning());
        assert!(game.settle(second.id, SettleVia::Completion).is_some());
    }

    #[test]
    fn test_bonus_segment() {
        assert_eq!(SEGMENTS[2].reward, Reward::Coins(2));
        assert_eq!(fallback_delay_ms(), 5120);
    }
}
