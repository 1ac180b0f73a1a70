//! Whitespace-token reader shared by the dye-sequence, radiometry, and
//! dye-track file formats, all of which are plain whitespace-separated text
//! (`f >> value` in the original, one flat token stream regardless of line
//! breaks).

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub struct Tokens {
    tokens: std::vec::IntoIter<String>,
}

impl Tokens {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text =
            fs::read_to_string(path).with_context(|| format!("open {}", path.display()))?;
        let tokens: Vec<String> = text.split_whitespace().map(str::to_owned).collect();
        Ok(Self {
            tokens: tokens.into_iter(),
        })
    }

    pub fn next_token(&mut self) -> Result<String> {
        self.tokens.next().context("unexpected end of file")
    }

    pub fn next_usize(&mut self) -> Result<usize> {
        self.next_token()?
            .parse()
            .context("expected a non-negative integer")
    }

    pub fn next_u32(&mut self) -> Result<u32> {
        self.next_token()?
            .parse()
            .context("expected a non-negative integer")
    }

    pub fn next_i64(&mut self) -> Result<i64> {
        self.next_token()?.parse().context("expected an integer")
    }

    pub fn next_f64(&mut self) -> Result<f64> {
        self.next_token()?
            .parse()
            .context("expected a floating-point number")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_mixed_tokens_across_lines() {
        let dir = std::env::temp_dir().join("fseq_io_tokens_test");
        fs::write(&dir, "3\n5 6.5\nhello\n").unwrap();
        let mut tokens = Tokens::open(&dir).unwrap();
        assert_eq!(tokens.next_usize().unwrap(), 3);
        assert_eq!(tokens.next_u32().unwrap(), 5);
        assert!((tokens.next_f64().unwrap() - 6.5).abs() < 1e-12);
        assert_eq!(tokens.next_token().unwrap(), "hello");
        fs::remove_file(&dir).ok();
    }

    #[test]
    fn errors_past_end_of_file() {
        let dir = std::env::temp_dir().join("fseq_io_tokens_test_empty");
        fs::write(&dir, "1\n").unwrap();
        let mut tokens = Tokens::open(&dir).unwrap();
        assert_eq!(tokens.next_usize().unwrap(), 1);
        assert!(tokens.next_usize().is_err());
        fs::remove_file(&dir).ok();
    }
}
