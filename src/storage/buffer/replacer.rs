use super::frame::FrameView;
use crate::storage::page::FrameId;

/// Replacer picks the frame to reuse when the buffer pool is full.
pub trait Replacer: Send {
    /// Find a frame to evict. Invalid frames are free real estate and may
    /// be returned right away, a pinned frame is never returned.
    ///
    /// Return None if every frame is pinned.
    fn pick_victim(&mut self, frames: &mut FrameView<'_>) -> Option<FrameId>;
}

/// ClockReplacer implements the second-chance (clock) replacement policy.
///
/// The clock hand sweeps the frames in a circle. An unpinned frame with its
/// reference bit set has the bit cleared and is passed over once, the next
/// unpinned frame found without the bit is the victim. The hand position
/// survives across calls.
///
/// A sweep inspects at most 2N frames: one loop to clear the reference bits
/// plus a second loop to act on them, so the sweep terminates even when every
/// unpinned frame starts with the bit set.
#[derive(Debug, Default)]
pub struct ClockReplacer {
    hand: FrameId,
    /// number of frames inspected by the last sweep.
    last_sweep_len: usize,
}

impl ClockReplacer {
    pub fn new() -> Self {
        ClockReplacer::default()
    }

    pub fn hand(&self) -> FrameId {
        self.hand
    }

    pub fn last_sweep_len(&self) -> usize {
        self.last_sweep_len
    }
}

impl Replacer for ClockReplacer {
    fn pick_victim(&mut self, frames: &mut FrameView<'_>) -> Option<FrameId> {
        self.last_sweep_len = 0;
        if frames.is_empty() {
            return None;
        }
        let n = frames.len();
        // the pool may have shrunk its view since the last call.
        self.hand %= n;

        for _ in 0..2 * n {
            let current = self.hand;
            self.last_sweep_len += 1;
            if !frames.is_valid(current) {
                return Some(current);
            }
            if !frames.is_pinned(current) {
                if !frames.ref_bit(current) {
                    return Some(current);
                }
                frames.clear_ref_bit(current);
            }
            self.hand = (current + 1) % n;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::buffer::frame::FrameDescriptor;

    fn frames(n: usize) -> Vec<FrameDescriptor> {
        vec![FrameDescriptor::new(); n]
    }

    fn pick(replacer: &mut ClockReplacer, frames: &mut [FrameDescriptor]) -> Option<FrameId> {
        replacer.pick_victim(&mut FrameView::new(frames))
    }

    #[test]
    fn test_invalid_frame_first() {
        let mut descs = frames(3);
        let mut replacer = ClockReplacer::new();

        // an invalid frame is returned without moving the hand.
        assert_eq!(Some(0), pick(&mut replacer, &mut descs));
        assert_eq!(Some(0), pick(&mut replacer, &mut descs));
        assert_eq!(1, replacer.last_sweep_len());

        descs[0].install(10);
        assert_eq!(Some(1), pick(&mut replacer, &mut descs));
        assert_eq!(1, replacer.hand());
    }

    #[test]
    fn test_all_pinned() {
        let mut descs = frames(4);
        for (i, d) in descs.iter_mut().enumerate() {
            d.install(i as i64);
        }
        let mut replacer = ClockReplacer::new();
        assert_eq!(None, pick(&mut replacer, &mut descs));
        assert_eq!(8, replacer.last_sweep_len());
        // pinned frames keep their reference bits.
        assert!(descs.iter().all(|d| d.ref_bit && d.pin_count == 1));
    }

    #[test]
    fn test_second_chance() {
        let mut descs = frames(3);
        for (i, d) in descs.iter_mut().enumerate() {
            d.install(i as i64);
        }
        let mut replacer = ClockReplacer::new();
        // frame 0 and 2 unpinned with the reference bit set, frame 1 pinned.
        descs[0].unpin(false);
        descs[2].unpin(false);

        // first loop clears 0 and 2, the second loop picks 0.
        assert_eq!(Some(0), pick(&mut replacer, &mut descs));
        assert_eq!(4, replacer.last_sweep_len());
        assert!(!descs[0].ref_bit);
        assert!(!descs[2].ref_bit);
        assert!(descs[1].ref_bit);

        // frame 0 gets reused and pinned, the hand stays, 2 goes next.
        descs[0].install(5);
        assert_eq!(Some(2), pick(&mut replacer, &mut descs));
        assert_eq!(3, replacer.last_sweep_len());
    }

    #[test]
    fn test_sweep_bounded() {
        // all frames unpinned with the reference bit set: the sweep needs
        // exactly N + 1 steps and never more than 2N.
        for n in 1..16 {
            let mut descs = frames(n);
            for (i, d) in descs.iter_mut().enumerate() {
                d.install(i as i64);
                d.unpin(false);
            }
            let mut replacer = ClockReplacer::new();
            let victim = pick(&mut replacer, &mut descs);
            assert_eq!(Some(0), victim);
            assert_eq!(n + 1, replacer.last_sweep_len());
            assert!(replacer.last_sweep_len() <= 2 * n);
        }
    }

    #[test]
    fn test_never_picks_pinned() {
        let mut descs = frames(5);
        for (i, d) in descs.iter_mut().enumerate() {
            d.install(i as i64);
        }
        descs[3].unpin(true);
        let mut replacer = ClockReplacer::new();
        for _ in 0..10 {
            let victim = pick(&mut replacer, &mut descs);
            assert_eq!(Some(3), victim);
            assert!(!descs[3].is_pinned());
        }
    }

    #[test]
    fn test_empty_view() {
        let mut replacer = ClockReplacer::new();
        assert_eq!(None, pick(&mut replacer, &mut []));
    }
}
