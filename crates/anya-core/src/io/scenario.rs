use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::{NumberedLines, keyword};
use crate::error::{Error, Result};
use crate::geom::SphericalPoint;

/// One benchmark query from a scenario file.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Scenario {
    pub bucket: u32,
    pub map: String,
    pub map_height: usize,
    pub map_width: usize,
    pub start: SphericalPoint,
    pub end: SphericalPoint,
    /// Reference path length, in degrees.
    pub optimal_cost: f64,
}

const FIELDS: usize = 9;

/// Read a `version 1` scenario file: one tab-separated query per line.
/// Blank lines are skipped.
pub fn read_scenarios<R: BufRead>(reader: R) -> Result<Vec<Scenario>> {
    let mut lines = NumberedLines::new(reader);
    let header = lines
        .next_line()?
        .ok_or_else(|| Error::format(1, "missing `version 1` header"))?;
    match keyword(&header, "version") {
        Some(rest) if rest == ["1"] => {}
        _ => {
            return Err(Error::format(1, format!("expected `version 1`, found `{header}`")));
        }
    }

    let mut out = Vec::new();
    while let Some(line) = lines.next_line()? {
        if line.trim().is_empty() {
            continue;
        }
        out.push(parse_line(&line, lines.line())?);
    }
    Ok(out)
}

/// [`read_scenarios`] from a file on disk.
pub fn load_scenarios(path: impl AsRef<Path>) -> Result<Vec<Scenario>> {
    let path = path.as_ref();
    let scenarios = read_scenarios(BufReader::new(File::open(path)?))?;
    log::debug!("loaded {} scenarios from {}", scenarios.len(), path.display());
    Ok(scenarios)
}

fn parse_line(line: &str, n: usize) -> Result<Scenario> {
    let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
    if fields.len() != FIELDS {
        return Err(Error::format(
            n,
            format!("expected {FIELDS} tab-separated fields, found {}", fields.len()),
        ));
    }
    fn num<T: std::str::FromStr>(s: &str, what: &str, n: usize) -> Result<T> {
        s.parse()
            .map_err(|_| Error::format(n, format!("invalid {what} `{s}`")))
    }
    let start = SphericalPoint::new(
        num(fields[4], "start latitude", n)?,
        num(fields[5], "start longitude", n)?,
    )?;
    let end = SphericalPoint::new(
        num(fields[6], "end latitude", n)?,
        num(fields[7], "end longitude", n)?,
    )?;
    Ok(Scenario {
        bucket: num(fields[0], "bucket", n)?,
        map: fields[1].to_string(),
        map_height: num(fields[2], "map height", n)?,
        map_width: num(fields[3], "map width", n)?,
        start,
        end,
        optimal_cost: num(fields[8], "optimal cost", n)?,
    })
}
