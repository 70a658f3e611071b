//! Windowed threshold sampler: a fixed-capacity circular buffer that turns
//! a noisy per-tick boolean test ("is this sample above/below a threshold")
//! into a debounced event, requiring a sustained majority of the window to
//! agree before a state transition latches onto a single noisy tick.

use heapless::Deque;

/// Maximum window capacity any single sampler instance can be configured
/// with. Every FSM state reuses the same backing storage at a smaller
/// runtime capacity, so this only needs to cover the largest window used
/// anywhere (the longest detection window divided by the FSM tick period).
pub const MAX_CAPACITY: usize = 4096;

/// A sliding window over the last `capacity` scalar samples, tracking how
/// many fell above (`over`) vs. at-or-below (`under`) a threshold.
///
/// Reused across FSM states: each state that needs detection calls
/// [`ThresholdSampler::reset`] with its own capacity and threshold on
/// entry, then feeds it one sample per tick for as long as it stays
/// active.
pub struct ThresholdSampler {
    buf: Deque<bool, MAX_CAPACITY>,
    capacity: usize,
    threshold: f32,
    over: u32,
    under: u32,
}

impl ThresholdSampler {
    /// A sampler with no samples yet, capacity 0 and threshold 0 — call
    /// [`reset`](Self::reset) before first use.
    pub const fn new() -> Self {
        Self {
            buf: Deque::new(),
            capacity: 0,
            threshold: 0.0,
            over: 0,
            under: 0,
        }
    }

    /// Clears the window and reconfigures capacity and threshold. `capacity`
    /// is clamped to [`MAX_CAPACITY`] and to at least 1.
    pub fn reset(&mut self, capacity: usize, threshold: f32) {
        self.buf.clear();
        self.capacity = capacity.clamp(1, MAX_CAPACITY);
        self.threshold = threshold;
        self.over = 0;
        self.under = 0;
    }

    /// Feeds one new scalar sample, evicting the oldest sample if the
    /// window is already full.
    pub fn push(&mut self, value: f32) {
        if self.buf.len() >= self.capacity {
            if let Some(evicted) = self.buf.pop_front() {
                if evicted {
                    self.over -= 1;
                } else {
                    self.under -= 1;
                }
            }
        }
        let is_over = value > self.threshold;
        // Capacity is clamped to MAX_CAPACITY above, so this never fails.
        let _ = self.buf.push_back(is_over);
        if is_over {
            self.over += 1;
        } else {
            self.under += 1;
        }
    }

    /// Number of samples currently in the window.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// True once the window has filled (`over + under >= capacity`) and the
    /// ratio of over-threshold samples to under-threshold samples strictly
    /// exceeds `r`. Use for "crossed upward" detections (launch,
    /// drogue-altitude-exceeded). A sustained one-sided signal — the common
    /// case in flight — would otherwise trip this after only a couple of
    /// samples, since the denominator floors at 1; the window-filled gate
    /// is what actually enforces the configured debounce duration.
    pub fn over_by_under(&self, r: f32) -> bool {
        self.is_filled() && (self.over as f32) > r * (self.under.max(1) as f32)
    }

    /// True once the window has filled (`over + under >= capacity`) and the
    /// ratio of under-threshold samples to over-threshold samples strictly
    /// exceeds `r`. Use for "fallen below" detections (burnout, apogee,
    /// main altitude, landed velocity).
    pub fn under_by_over(&self, r: f32) -> bool {
        self.is_filled() && (self.under as f32) > r * (self.over.max(1) as f32)
    }

    /// True once `capacity` samples have accumulated since the last reset.
    fn is_filled(&self) -> bool {
        (self.over + self.under) as usize >= self.capacity
    }
}

impl Default for ThresholdSampler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn over_and_under_sum_to_window_length() {
        let mut s = ThresholdSampler::new();
        s.reset(5, 1.0);
        for v in [0.0, 2.0, 0.0, 3.0, 0.5] {
            s.push(v);
        }
        assert_eq!(s.len(), 5);
    }

    #[test]
    fn eviction_keeps_counts_consistent_with_window() {
        let mut s = ThresholdSampler::new();
        s.reset(3, 1.0);
        for v in [5.0, 5.0, 5.0, 0.0, 0.0, 0.0] {
            s.push(v);
        }
        // window now holds the last 3 values: 0.0, 0.0, 0.0
        assert!(s.under_by_over(1.0));
        assert!(!s.over_by_under(1.0));
    }

    #[test]
    fn over_by_under_requires_strict_majority() {
        let mut s = ThresholdSampler::new();
        s.reset(4, 1.0);
        // two over, two under: 2 > 1.0 * 2 is false
        for v in [5.0, 5.0, 0.0, 0.0] {
            s.push(v);
        }
        assert!(!s.over_by_under(1.0));
        // three over, one under: 3 > 1.0 * 1 is true
        s.push(5.0);
        assert!(s.over_by_under(1.0));
    }

    #[test]
    fn one_sided_signal_does_not_trip_before_the_window_fills() {
        let mut s = ThresholdSampler::new();
        s.reset(30, 1.0);
        // A sustained one-sided signal (a step, a monotonic crossing) never
        // produces a single "under" sample: over stays the only nonzero
        // count. Without the window-filled gate, over_by_under would trip
        // as soon as over reached 2 (2 > 1.0 * max(1, 0)).
        for i in 0..29 {
            s.push(5.0);
            assert!(!s.over_by_under(1.0), "tripped after only {} samples", i + 1);
        }
        s.push(5.0);
        assert!(s.over_by_under(1.0));
    }

    #[test]
    fn threshold_boundary_is_exclusive_over() {
        let mut s = ThresholdSampler::new();
        s.reset(2, 1.0);
        s.push(1.0); // equal to threshold counts as under
        s.push(1.0);
        assert!(s.under_by_over(0.5));
        assert!(!s.over_by_under(0.0));
    }

    #[test]
    fn reset_clears_previous_window() {
        let mut s = ThresholdSampler::new();
        s.reset(3, 1.0);
        s.push(10.0);
        s.push(10.0);
        s.reset(3, 1.0);
        assert_eq!(s.len(), 0);
        assert!(!s.over_by_under(0.0));
        assert!(!s.under_by_over(0.0));
    }

    #[test]
    fn capacity_is_clamped_to_max() {
        let mut s = ThresholdSampler::new();
        s.reset(usize::MAX, 1.0);
        assert_eq!(s.capacity, MAX_CAPACITY);
    }
}
