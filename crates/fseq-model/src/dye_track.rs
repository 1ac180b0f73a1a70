//! Expected maximum per-channel dye counts across sequencing cycles.

use crate::dye_seq::DyeSeq;

/// Dense `(T x C)` grid of unsigned counts: for each timestep `t` and
/// channel `c`, the number of still-attached dyes on channel `c` if every
/// Edman cycle up to `t` succeeded without loss.
///
/// Built by walking the dye sequence from the last residue backward,
/// accumulating per-channel counts; `counts[t]` is therefore the per-channel
/// tally over the suffix `dye_seq[t..]`, which is monotonically
/// non-increasing in `t` and zero beyond the sequence's length.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DyeTrack {
    num_timesteps: usize,
    num_channels: usize,
    counts: Vec<u32>, // row-major, shape (num_timesteps, num_channels)
}

impl DyeTrack {
    #[must_use]
    pub fn from_dye_seq(dye_seq: &DyeSeq, num_timesteps: usize) -> Self {
        let num_channels = dye_seq.num_channels() as usize;
        let mut counts = vec![0u32; num_timesteps * num_channels];
        let mut running = vec![0u32; num_channels];
        let len = dye_seq.len();
        for pos in (0..len).rev() {
            let residue = dye_seq.get(pos);
            if residue >= 0 {
                running[residue as usize] += 1;
            }
            if pos < num_timesteps {
                counts[pos * num_channels..(pos + 1) * num_channels].copy_from_slice(&running);
            }
        }
        Self {
            num_timesteps,
            num_channels,
            counts,
        }
    }

    /// Builds a track directly from a raw row-major counts grid, as read
    /// from a dye-tracks library file rather than derived from a `DyeSeq`.
    ///
    /// # Panics
    /// Panics if `counts.len() != num_timesteps * num_channels`.
    #[must_use]
    pub fn from_counts(num_timesteps: usize, num_channels: usize, counts: Vec<u32>) -> Self {
        assert_eq!(counts.len(), num_timesteps * num_channels);
        Self {
            num_timesteps,
            num_channels,
            counts,
        }
    }

    #[must_use]
    pub fn num_timesteps(&self) -> usize {
        self.num_timesteps
    }

    #[must_use]
    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    #[must_use]
    pub fn get(&self, t: usize, c: usize) -> u32 {
        self.counts[t * self.num_channels + c]
    }

    /// Per-channel counts at timestep `t`.
    #[must_use]
    pub fn row(&self, t: usize) -> &[u32] {
        &self.counts[t * self.num_channels..(t + 1) * self.num_channels]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_are_non_increasing_in_t() {
        let seq = DyeSeq::new("1001", 2).unwrap();
        let track = DyeTrack::from_dye_seq(&seq, 4);
        for c in 0..2 {
            for t in 1..4 {
                assert!(track.get(t, c) <= track.get(t - 1, c));
            }
        }
    }

    #[test]
    fn zero_padded_beyond_sequence_length() {
        let seq = DyeSeq::new("0", 1).unwrap();
        let track = DyeTrack::from_dye_seq(&seq, 3);
        assert_eq!(track.get(0, 0), 1);
        assert_eq!(track.get(1, 0), 0);
        assert_eq!(track.get(2, 0), 0);
    }

    #[test]
    fn matches_hand_computed_two_channel_example() {
        // residues: pos0 channel1, pos1 channel0, pos2 gap, pos3 channel1, pos4 channel1
        let seq = DyeSeq::new("10.11", 2).unwrap();
        let track = DyeTrack::from_dye_seq(&seq, 5);
        // suffix from pos0..end: channel0 count=1, channel1 count=3
        assert_eq!(track.row(0), &[1, 3]);
        // suffix from pos2..end (gap,1,1): channel0=0, channel1=2
        assert_eq!(track.row(2), &[0, 2]);
        // suffix from pos4..end (1): channel0=0, channel1=1
        assert_eq!(track.row(4), &[0, 1]);
    }
}
