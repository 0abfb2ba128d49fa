//! Step-range strings: `"1-5,3,6,7"` selects 1-based step indices, each
//! token a single number or an inclusive `N-M` span. Duplicates collapse to
//! their first occurrence and the order the user wrote is kept verbatim.

use crate::id::StepId;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("empty step range")]
    Empty,
    #[error("bad step range token '{0}'")]
    BadToken(String),
    #[error("step range {0}-{1} is reversed")]
    Reversed(u64, u64),
    #[error("step {0} is out of range (pipeline has {1} steps)")]
    OutOfRange(u64, usize),
}

/// Parse `range` against a pipeline of `total` steps. Returned ids are the
/// 0-based step indices, in first-appearance order.
pub fn parse(range: &str, total: usize) -> Result<Vec<StepId>, Error> {
    if range.trim().is_empty() {
        return Err(Error::Empty);
    }
    let mut ids = Vec::new();
    for token in range.split(',') {
        let token = token.trim();
        let (lo, hi) = match token.split_once('-') {
            Some((lo, hi)) => (number(lo, token)?, number(hi, token)?),
            None => {
                let n = number(token, token)?;
                (n, n)
            }
        };
        if lo > hi {
            return Err(Error::Reversed(lo, hi));
        }
        if lo < 1 {
            return Err(Error::OutOfRange(lo, total));
        }
        if hi > total as u64 {
            return Err(Error::OutOfRange(hi, total));
        }
        for n in lo..=hi {
            let id = StepId::from(n as usize - 1);
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
    }
    Ok(ids)
}

fn number(text: &str, token: &str) -> Result<u64, Error> {
    text.parse().map_err(|_| Error::BadToken(token.to_string()))
}

/// Inverse of [`parse`]: consecutive runs compress back into `N-M` tokens,
/// so `parse(&render(ids), total)` reproduces `ids` exactly.
pub fn render(ids: &[StepId]) -> String {
    let mut out = String::new();
    let mut i = 0;
    while i < ids.len() {
        let start = usize::from(ids[i]);
        let mut j = i;
        while j + 1 < ids.len() && usize::from(ids[j + 1]) == usize::from(ids[j]) + 1 {
            j += 1;
        }
        let end = usize::from(ids[j]);
        if !out.is_empty() {
            out.push(',');
        }
        if start == end {
            out.push_str(&(start + 1).to_string());
        } else {
            out.push_str(&format!("{}-{}", start + 1, end + 1));
        }
        i = j + 1;
    }
    out
}
