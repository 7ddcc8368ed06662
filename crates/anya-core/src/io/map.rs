use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use super::{NumberedLines, keyword};
use crate::config::GeoConfig;
use crate::error::{Error, Result};
use crate::grid::Grid;

/// An octile map: a `type octile` header, `height` and `width` lines, then one
/// line per tile row of `0` (free) / `1` (blocked) tokens.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MapFile {
    pub height: usize,
    pub width: usize,
    /// Row-major, `true` = blocked.
    pub tiles: Vec<Vec<bool>>,
}

impl MapFile {
    pub fn parse<R: BufRead>(reader: R) -> Result<Self> {
        let mut lines = NumberedLines::new(reader);

        let header = require(&mut lines, "map header")?;
        match keyword(&header, "type") {
            Some(rest) if rest.len() == 1 && rest[0].eq_ignore_ascii_case("octile") => {}
            _ => {
                return Err(Error::format(
                    lines.line(),
                    format!("expected `type octile`, found `{header}`"),
                ));
            }
        }
        let height = dimension(&mut lines, "height")?;
        let width = dimension(&mut lines, "width")?;

        let mut tiles = Vec::with_capacity(height);
        for row in 0..height {
            let Some(line) = lines.next_line()? else {
                return Err(Error::format(
                    lines.line() + 1,
                    format!("expected {height} tile rows, found {row}"),
                ));
            };
            let cells = line
                .split_whitespace()
                .map(|t| match t {
                    "0" => Ok(false),
                    "1" => Ok(true),
                    other => Err(Error::format(
                        lines.line(),
                        format!("invalid tile `{other}`, expected 0 or 1"),
                    )),
                })
                .collect::<Result<Vec<bool>>>()?;
            if cells.len() != width {
                return Err(Error::format(
                    lines.line(),
                    format!("expected {width} tiles, found {}", cells.len()),
                ));
            }
            tiles.push(cells);
        }

        while let Some(line) = lines.next_line()? {
            if !line.trim().is_empty() {
                return Err(Error::format(lines.line(), "unexpected content after the last row"));
            }
        }

        Ok(Self {
            height,
            width,
            tiles,
        })
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let map = Self::parse(BufReader::new(File::open(path)?))?;
        log::debug!("loaded map {} ({}x{})", path.display(), map.height, map.width);
        Ok(map)
    }

    /// Build the [`Grid`] for this map.
    pub fn into_grid(self, config: GeoConfig) -> Result<Grid> {
        Grid::new(config, self.height, self.width, self.tiles)
    }
}

impl FromStr for MapFile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s.as_bytes())
    }
}

fn require<R: BufRead>(lines: &mut NumberedLines<R>, what: &str) -> Result<String> {
    lines
        .next_line()?
        .ok_or_else(|| Error::format(lines.line() + 1, format!("missing {what}")))
}

fn dimension<R: BufRead>(lines: &mut NumberedLines<R>, name: &str) -> Result<usize> {
    let line = require(lines, name)?;
    let n = lines.line();
    let bad = || Error::format(n, format!("expected `{name} <positive integer>`, found `{line}`"));
    let rest = keyword(&line, name).ok_or_else(bad)?;
    match rest.as_slice() {
        [v] => match v.parse::<usize>() {
            Ok(v) if v > 0 => Ok(v),
            _ => Err(bad()),
        },
        _ => Err(bad()),
    }
}
