//! Keyframed animation curves
//!
//! A curve is a list of (time, value) keys sampled with either linear or
//! smoothstep interpolation between neighbours. Times outside the key range
//! clamp to the first/last value. Used for the jump arc, the landing bob and
//! the sink animation.

use serde::{Deserialize, Serialize};

/// A single (time, value) key
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f32,
    pub value: f32,
}

impl Keyframe {
    pub const fn new(time: f32, value: f32) -> Self {
        Self { time, value }
    }
}

/// Piecewise curve over sorted keyframes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    pub keys: Vec<Keyframe>,
    /// Ease in/out between keys instead of straight lines
    #[serde(default)]
    pub smooth: bool,
}

impl Curve {
    pub fn new(keys: Vec<Keyframe>, smooth: bool) -> Self {
        Self { keys, smooth }
    }

    /// Straight line from (0, from) to (1, to)
    pub fn linear(from: f32, to: f32) -> Self {
        Self::new(vec![Keyframe::new(0.0, from), Keyframe::new(1.0, to)], false)
    }

    /// Up-and-down arc peaking at `peak_time` with value 1
    pub fn jump_arc(peak_time: f32) -> Self {
        Self::new(
            vec![
                Keyframe::new(0.0, 0.0),
                Keyframe::new(peak_time, 1.0),
                Keyframe::new(1.0, 0.0),
            ],
            true,
        )
    }

    /// Quick dip then slow recovery
    pub fn land_bob() -> Self {
        Self::new(
            vec![
                Keyframe::new(0.0, 0.0),
                Keyframe::new(0.15, -1.0),
                Keyframe::new(1.0, 0.0),
            ],
            true,
        )
    }

    /// Slow settle until the second key, then a rapid plunge
    pub fn sink() -> Self {
        Self::new(
            vec![
                Keyframe::new(0.0, 0.0),
                Keyframe::new(0.8, -0.5),
                Keyframe::new(1.0, -6.0),
            ],
            false,
        )
    }

    /// Sample the curve at `t`
    pub fn evaluate(&self, t: f32) -> f32 {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(f), Some(l)) => (f, l),
            _ => return 0.0,
        };
        if t <= first.time {
            return first.value;
        }
        if t >= last.time {
            return last.value;
        }

        // Keys are few; a linear scan is fine
        for pair in self.keys.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if t <= b.time {
                let span = b.time - a.time;
                if span <= 0.0 {
                    return b.value;
                }
                let mut u = (t - a.time) / span;
                if self.smooth {
                    u = u * u * (3.0 - 2.0 * u);
                }
                return a.value + (b.value - a.value) * u;
            }
        }

        last.value
    }

    /// Time of the key at `index`, if present
    pub fn key_time(&self, index: usize) -> Option<f32> {
        self.keys.get(index).map(|k| k.time)
    }

    /// At least two finite keys with strictly increasing times
    pub fn is_well_formed(&self) -> bool {
        self.keys.len() >= 2
            && self
                .keys
                .iter()
                .all(|k| k.time.is_finite() && k.value.is_finite())
            && self.keys.windows(2).all(|w| w[0].time < w[1].time)
    }
}
