//! Writer for the classification output CSV: header
//! `radmat_iz,best_pep_iz,best_pep_score`, one row per radiometry.
//!
//! Takes plain `(library_id, adjusted_score)` pairs rather than
//! `fseq-classify`'s `ScoredClassification` directly, so this crate stays
//! decoupled from the classifier/HMM layers.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub fn write_classifications<P: AsRef<Path>>(
    path: P,
    rows: impl IntoIterator<Item = (i64, f64)>,
) -> Result<()> {
    let path = path.as_ref();
    let f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut w = BufWriter::new(f);
    writeln!(w, "radmat_iz,best_pep_iz,best_pep_score").context("write csv header")?;
    for (i, (library_id, adjusted_score)) in rows.into_iter().enumerate() {
        writeln!(w, "{i},{library_id},{adjusted_score:?}").context("write csv row")?;
    }
    w.flush().context("flush csv writer")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn writes_header_and_rows() {
        let path = std::env::temp_dir().join("fseq_io_csv_writer_test");
        write_classifications(&path, vec![(7, 0.5), (-1, 0.0)]).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(lines.next().unwrap(), "radmat_iz,best_pep_iz,best_pep_score");
        assert_eq!(lines.next().unwrap(), "0,7,0.5");
        assert_eq!(lines.next().unwrap(), "1,-1,0.0");
        fs::remove_file(&path).ok();
    }

    #[test]
    fn score_round_trips_at_full_precision() {
        let path = std::env::temp_dir().join("fseq_io_csv_writer_precision_test");
        let value = 1.876_822_091_893_613e-96;
        write_classifications(&path, vec![(1, value)]).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        let score_str = contents.lines().nth(1).unwrap().split(',').nth(2).unwrap();
        assert_eq!(score_str.parse::<f64>().unwrap(), value);
        fs::remove_file(&path).ok();
    }
}
