//! Reader for the dye-sequences file: `C`, `N`, then `N` records of
//! `dye_string multiplicity library_id`.

use crate::tokens::Tokens;
use anyhow::Result;
use fseq_model::DyeSeq;
use std::path::Path;

/// One parsed dye-sequence record, carrying its peptide multiplicity
/// (how many physical peptides in the digest share this dye sequence) and
/// the library id it is reported under.
#[derive(Clone, Debug)]
pub struct DyeSeqRecord {
    pub dye_seq: DyeSeq,
    pub multiplicity: u32,
    pub library_id: i64,
}

#[derive(Clone, Debug)]
pub struct DyeSeqsFile {
    pub num_channels: u32,
    pub records: Vec<DyeSeqRecord>,
}

pub fn read_dye_seqs<P: AsRef<Path>>(path: P) -> Result<DyeSeqsFile> {
    let mut tokens = Tokens::open(path)?;
    let num_channels = tokens.next_u32()?;
    let num_dye_seqs = tokens.next_usize()?;
    let mut records = Vec::with_capacity(num_dye_seqs);
    for _ in 0..num_dye_seqs {
        let raw = tokens.next_token()?;
        let multiplicity = tokens.next_u32()?;
        let library_id = tokens.next_i64()?;
        let dye_seq = DyeSeq::new(&raw, num_channels)?;
        records.push(DyeSeqRecord {
            dye_seq,
            multiplicity,
            library_id,
        });
    }
    Ok(DyeSeqsFile {
        num_channels,
        records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn reads_records_in_order() {
        let path = std::env::temp_dir().join("fseq_io_dye_seqs_test");
        fs::write(&path, "2\n2\n10.01111 3 7\n0. 1 8\n").unwrap();
        let file = read_dye_seqs(&path).unwrap();
        assert_eq!(file.num_channels, 2);
        assert_eq!(file.records.len(), 2);
        assert_eq!(file.records[0].multiplicity, 3);
        assert_eq!(file.records[0].library_id, 7);
        assert_eq!(file.records[0].dye_seq.len(), 8);
        assert_eq!(file.records[1].dye_seq.len(), 1);
        fs::remove_file(&path).ok();
    }

    #[test]
    fn rejects_channel_index_past_model_width() {
        let path = std::env::temp_dir().join("fseq_io_dye_seqs_bad_test");
        fs::write(&path, "1\n1\n2 1 0\n").unwrap();
        assert!(read_dye_seqs(&path).is_err());
        fs::remove_file(&path).ok();
    }
}
