//! Reader/writer for the radiometries file: `T C R` header, then `R·T·C`
//! doubles in row-major (radiometry-major, timestep-major) order.

use crate::tokens::Tokens;
use anyhow::{Context, Result};
use fseq_model::Radiometry;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub struct RadiometriesFile {
    pub num_timesteps: usize,
    pub num_channels: usize,
    pub radiometries: Vec<Radiometry>,
}

pub fn read_radiometries<P: AsRef<Path>>(path: P) -> Result<RadiometriesFile> {
    let mut tokens = Tokens::open(path)?;
    let num_timesteps = tokens.next_usize()?;
    let num_channels = tokens.next_usize()?;
    let num_radiometries = tokens.next_usize()?;
    let mut radiometries = Vec::with_capacity(num_radiometries);
    for _ in 0..num_radiometries {
        let mut values = Vec::with_capacity(num_timesteps * num_channels);
        for _ in 0..num_timesteps * num_channels {
            values.push(tokens.next_f64()?);
        }
        radiometries.push(Radiometry::new(num_timesteps, num_channels, values));
    }
    Ok(RadiometriesFile {
        num_timesteps,
        num_channels,
        radiometries,
    })
}

pub fn write_radiometries<P: AsRef<Path>>(
    path: P,
    num_timesteps: usize,
    num_channels: usize,
    radiometries: &[Radiometry],
) -> Result<()> {
    let path = path.as_ref();
    let f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut w = BufWriter::new(f);
    writeln!(w, "{num_timesteps} {num_channels} {}", radiometries.len())
        .context("write radiometries header")?;
    for radiometry in radiometries {
        for t in 0..num_timesteps {
            for c in 0..num_channels {
                write!(w, "{:?} ", radiometry.get(t, c)).context("write radiometry value")?;
            }
        }
        writeln!(w).context("write radiometry newline")?;
    }
    w.flush().context("flush radiometries writer")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn round_trips_through_write_then_read() {
        let path = std::env::temp_dir().join("fseq_io_radiometries_test");
        let radiometries = vec![
            Radiometry::new(2, 1, vec![1.0, 2.0]),
            Radiometry::new(2, 1, vec![3.0, 4.0]),
        ];
        write_radiometries(&path, 2, 1, &radiometries).unwrap();
        let file = read_radiometries(&path).unwrap();
        assert_eq!(file.num_timesteps, 2);
        assert_eq!(file.num_channels, 1);
        assert_eq!(file.radiometries, radiometries);
        fs::remove_file(&path).ok();
    }
}
