//! Expected per-residue channel labeling of a peptide.

use anyhow::{bail, Result};

/// Ordered sequence of short integers over `{-1 (gap), 0, .., num_channels-1}`.
///
/// Built from a string over `{'.', '0'..'9'}` where a digit names the
/// channel a residue is labeled on and `.` marks an unlabeled residue.
/// Trailing gaps are trimmed at construction; the sequence is immutable
/// afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DyeSeq {
    residues: Vec<i16>,
    num_channels: u32,
}

impl DyeSeq {
    /// Parses `s`, validates every channel index is `< num_channels`, and
    /// trims trailing gaps.
    ///
    /// # Errors
    /// Returns an error if `s` contains a channel index `>= num_channels`
    /// or any character outside `{'.', '0'..'9'}`.
    pub fn new(s: &str, num_channels: u32) -> Result<Self> {
        let mut residues = Vec::with_capacity(s.len());
        for ch in s.chars() {
            let residue = match ch {
                '.' => -1,
                '0'..='9' => (ch as i16) - ('0' as i16),
                other => bail!("dye sequence has invalid character {other:?}"),
            };
            if residue >= 0 && residue as u32 >= num_channels {
                bail!(
                    "dye sequence references channel {residue} but model has only {num_channels} channels"
                );
            }
            residues.push(residue);
        }
        while residues.last() == Some(&-1) {
            residues.pop();
        }
        Ok(Self {
            residues,
            num_channels,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.residues.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }

    #[must_use]
    pub fn num_channels(&self) -> u32 {
        self.num_channels
    }

    /// Residue at `pos`, or `-1` (gap) if `pos` is past the end of the
    /// sequence.
    #[must_use]
    pub fn get(&self, pos: usize) -> i16 {
        self.residues.get(pos).copied().unwrap_or(-1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_trailing_gaps() {
        let seq = DyeSeq::new("10...", 2).unwrap();
        assert_eq!(seq.len(), 2);
        assert_eq!(seq.get(0), 1);
        assert_eq!(seq.get(1), 0);
    }

    #[test]
    fn out_of_bounds_reads_as_gap() {
        let seq = DyeSeq::new("0", 1).unwrap();
        assert_eq!(seq.get(5), -1);
    }

    #[test]
    fn rejects_channel_index_past_model_width() {
        assert!(DyeSeq::new("2", 1).is_err());
    }

    #[test]
    fn internal_gaps_survive() {
        let seq = DyeSeq::new("1.0", 2).unwrap();
        assert_eq!(seq.len(), 3);
        assert_eq!(seq.get(1), -1);
    }
}
