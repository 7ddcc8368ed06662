//! Readers for octile map files and scenario files.

mod map;
mod scenario;

pub use map::MapFile;
pub use scenario::{Scenario, load_scenarios, read_scenarios};

use std::io::{self, BufRead};

use crate::error::Result;

/// Line reader that tracks 1-based line numbers and strips `\r`.
pub(crate) struct NumberedLines<R> {
    inner: io::Lines<R>,
    line: usize,
}

impl<R: BufRead> NumberedLines<R> {
    pub(crate) fn new(reader: R) -> Self {
        Self {
            inner: reader.lines(),
            line: 0,
        }
    }

    /// Number of the line most recently returned.
    pub(crate) fn line(&self) -> usize {
        self.line
    }

    pub(crate) fn next_line(&mut self) -> Result<Option<String>> {
        match self.inner.next() {
            Some(l) => {
                self.line += 1;
                let mut l = l?;
                if l.ends_with('\r') {
                    l.pop();
                }
                Ok(Some(l))
            }
            None => Ok(None),
        }
    }
}

/// Whether `line` is `keyword` followed by whitespace-separated `rest`,
/// compared case-insensitively. Returns the remaining tokens on a match.
pub(crate) fn keyword<'a>(line: &'a str, keyword: &str) -> Option<Vec<&'a str>> {
    let mut tokens = line.split_whitespace();
    let first = tokens.next()?;
    first
        .eq_ignore_ascii_case(keyword)
        .then(|| tokens.collect())
}
