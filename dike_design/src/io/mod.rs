//! File input and output helpers for project data.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use crate::error::{DesignError, DesignResult};
use crate::geometry::{Point, Point3};

pub mod geojson;
pub mod project;

/// Reads a file to string.
pub fn read_to_string(path: impl AsRef<Path>) -> DesignResult<String> {
    let mut buffer = String::new();
    File::open(path)?.read_to_string(&mut buffer)?;
    Ok(buffer)
}

/// Writes a string to a file, replacing its contents.
pub fn write_string(path: impl AsRef<Path>, contents: &str) -> DesignResult<()> {
    let mut file = File::create(path)?;
    file.write_all(contents.as_bytes())?;
    Ok(())
}

/// Reads the non-empty lines of a file. Lines starting with `#` are comments.
pub fn read_lines(path: impl AsRef<Path>) -> DesignResult<Vec<String>> {
    Ok(read_to_string(path)?
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(String::from)
        .collect())
}

fn parse_row(line: &str, idx: usize, want: usize) -> DesignResult<Vec<f64>> {
    let parts: Vec<&str> = line.split(',').map(str::trim).collect();
    if parts.len() < want {
        return Err(DesignError::Parse(format!(
            "line {}: expected {want} comma-separated values",
            idx + 1
        )));
    }
    parts[..want]
        .iter()
        .map(|s| {
            s.parse::<f64>()
                .map_err(|e| DesignError::Parse(format!("line {}: {e}", idx + 1)))
        })
        .collect()
}

/// Parses `x,y` rows. A first row that does not parse is taken as a header.
pub fn parse_points_csv(text: &str) -> DesignResult<Vec<Point>> {
    parse_rows(text, 2)
        .map(|rows| rows.into_iter().map(|r| Point::new(r[0], r[1])).collect())
}

/// Parses `x,y,z` rows. A first row that does not parse is taken as a header.
pub fn parse_points3_csv(text: &str) -> DesignResult<Vec<Point3>> {
    parse_rows(text, 3).map(|rows| {
        rows.into_iter()
            .map(|r| Point3::new(r[0], r[1], r[2]))
            .collect()
    })
}

fn parse_rows(text: &str, want: usize) -> DesignResult<Vec<Vec<f64>>> {
    let mut rows = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match parse_row(line, idx, want) {
            Ok(row) => rows.push(row),
            Err(_) if rows.is_empty() && line.chars().any(char::is_alphabetic) => {
                log::debug!("skipping header row '{line}'");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(rows)
}

pub fn read_points_csv(path: impl AsRef<Path>) -> DesignResult<Vec<Point>> {
    parse_points_csv(&read_to_string(path)?)
}

pub fn read_points3_csv(path: impl AsRef<Path>) -> DesignResult<Vec<Point3>> {
    parse_points3_csv(&read_to_string(path)?)
}

/// Writes points as `x,y` rows.
pub fn write_points_csv(path: impl AsRef<Path>, points: &[Point]) -> DesignResult<()> {
    let mut file = File::create(path)?;
    for p in points {
        writeln!(file, "{},{}", p.x, p.y)?;
    }
    Ok(())
}
