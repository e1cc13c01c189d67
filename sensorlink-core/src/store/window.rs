//! Bounded FIFO of numeric samples

use heapless::Deque;

/// Last `W` samples of one numeric field
#[derive(Debug, Clone)]
pub struct SampleWindow<const W: usize> {
    samples: Deque<f64, W>,
}

impl<const W: usize> SampleWindow<W> {
    pub const fn new() -> Self {
        Self {
            samples: Deque::new(),
        }
    }

    /// Append a sample, evicting the oldest when full
    pub fn push(&mut self, sample: f64) {
        if self.samples.is_full() {
            self.samples.pop_front();
        }
        // Cannot fail: a slot was freed above
        let _ = self.samples.push_back(sample);
    }

    /// Arithmetic mean, `None` with fewer than 2 samples
    pub fn mean(&self) -> Option<f64> {
        if self.samples.len() < 2 {
            return None;
        }
        let sum: f64 = self.samples.iter().sum();
        Some(sum / self.samples.len() as f64)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Samples from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.samples.iter()
    }
}

impl<const W: usize> Default for SampleWindow<W> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_mean_needs_two_samples() {
        let mut window: SampleWindow<4> = SampleWindow::new();
        assert_eq!(window.mean(), None);
        window.push(3.0);
        assert_eq!(window.mean(), None);
        window.push(5.0);
        assert_eq!(window.mean(), Some(4.0));
    }

    #[test]
    fn test_constant_input_stays_exact() {
        let mut window: SampleWindow<60> = SampleWindow::new();
        for i in 0..500 {
            window.push(10.0);
            if i >= 1 {
                assert_eq!(window.mean(), Some(10.0));
            }
        }
        assert_eq!(window.len(), 60);
    }

    proptest! {
        #[test]
        fn prop_window_keeps_newest_samples(samples in proptest::collection::vec(-1e6f64..1e6, 0..40)) {
            let mut window: SampleWindow<8> = SampleWindow::new();
            for &s in &samples {
                window.push(s);
            }

            let keep = samples.len().min(8);
            let expected = &samples[samples.len() - keep..];
            let actual: std::vec::Vec<f64> = window.iter().copied().collect();
            prop_assert_eq!(&actual[..], expected);
        }
    }
}
