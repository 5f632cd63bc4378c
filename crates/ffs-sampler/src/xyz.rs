//! Plain XYZ files with the box edge lengths on the comment line
//! (`# boxdims lx ly lz`).

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use ffs_core::errors::{ErrorInfo, FfsError};
use ffs_core::{Configuration, Position, SimBox};

const SPECIES: &str = "X";

/// Renders a configuration as XYZ text.
pub fn to_xyz_string(config: &Configuration) -> String {
    let [lx, ly, lz] = config.sim_box.lengths;
    let mut out = String::new();
    let _ = writeln!(out, "{}", config.len());
    let _ = writeln!(out, "# boxdims {lx} {ly} {lz}");
    for [x, y, z] in &config.positions {
        let _ = writeln!(out, "{SPECIES} {x} {y} {z}");
    }
    out
}

/// Parses XYZ text. The z periodicity is not stored in the file and is
/// supplied by the caller.
pub fn from_xyz_str(text: &str, periodic_z: bool) -> Result<Configuration, FfsError> {
    let mut lines = text.lines();
    let count: usize = lines
        .next()
        .and_then(|line| line.trim().parse().ok())
        .ok_or_else(|| parse_error("xyz-count", "first line must hold the particle count", 1))?;

    let header = lines
        .next()
        .ok_or_else(|| parse_error("xyz-boxdims", "missing box dimension line", 2))?;
    let fields: Vec<&str> = header.split_whitespace().collect();
    if fields.len() < 3 {
        return Err(parse_error("xyz-boxdims", "box dimension line needs three lengths", 2));
    }
    let lengths = parse_triple(&fields[fields.len() - 3..], 2)?;
    let sim_box = SimBox::new(lengths, periodic_z)?;

    let mut positions = Vec::new();
    for (offset, line) in lines.filter(|line| !line.trim().is_empty()).enumerate() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 3 {
            return Err(parse_error("xyz-position", "position line needs three coordinates", offset + 3));
        }
        positions.push(parse_triple(&fields[fields.len() - 3..], offset + 3)?);
    }
    if positions.len() != count {
        return Err(FfsError::Serde(
            ErrorInfo::new("xyz-count", "particle count does not match position lines")
                .with_context("declared", count)
                .with_context("found", positions.len()),
        ));
    }
    Configuration::new(positions, sim_box)
}

/// Writes a configuration to an XYZ file, creating parent directories.
pub fn write_xyz(path: &Path, config: &Configuration) -> Result<(), FfsError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| FfsError::io("xyz-mkdir", err, parent))?;
    }
    fs::write(path, to_xyz_string(config)).map_err(|err| FfsError::io("xyz-write", err, path))
}

/// Reads a configuration from an XYZ file.
pub fn read_xyz(path: &Path, periodic_z: bool) -> Result<Configuration, FfsError> {
    let text = fs::read_to_string(path).map_err(|err| FfsError::io("xyz-read", err, path))?;
    from_xyz_str(&text, periodic_z).map_err(|err| match err {
        FfsError::Serde(info) => FfsError::Serde(info.with_context("path", path.display())),
        other => other,
    })
}

fn parse_triple(fields: &[&str], line: usize) -> Result<Position, FfsError> {
    let mut out = [0.0; 3];
    for (slot, field) in out.iter_mut().zip(fields) {
        *slot = field.parse().map_err(|_| {
            FfsError::Serde(
                ErrorInfo::new("xyz-number", "could not parse number")
                    .with_context("line", line)
                    .with_context("field", field),
            )
        })?;
    }
    Ok(out)
}

fn parse_error(code: &str, message: &str, line: usize) -> FfsError {
    FfsError::Serde(ErrorInfo::new(code, message).with_context("line", line))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_header_and_positions() {
        let text = "2\n# boxdims 4.0 5.0 6.0\nX 0.1 0.2 0.3\nX 1 2 3\n";
        let config = from_xyz_str(text, false).unwrap();
        assert_eq!(config.sim_box.lengths, [4.0, 5.0, 6.0]);
        assert!(!config.sim_box.periodic_z);
        assert_eq!(config.positions[1], [1.0, 2.0, 3.0]);
    }

    #[test]
    fn written_text_parses_back() {
        let config =
            Configuration::new(vec![[0.5, 1.25, 2.0]], SimBox::new([3.0, 3.0, 4.0], true).unwrap())
                .unwrap();
        let text = to_xyz_string(&config);
        assert!(text.lines().nth(1).unwrap().starts_with("# boxdims 3 3 4"));
        assert_eq!(from_xyz_str(&text, true).unwrap(), config);
    }

    #[test]
    fn reports_bad_lines() {
        let err = from_xyz_str("2\n# boxdims 1 1 1\nX 0 0 0\n", true).unwrap_err();
        assert_eq!(err.info().code, "xyz-count");
        let err = from_xyz_str("1\n# boxdims 1 1 1\nX 0 zero 0\n", true).unwrap_err();
        assert_eq!(err.info().code, "xyz-number");
        assert_eq!(err.info().context["line"], "3");
    }

    #[test]
    fn coordinates_keep_full_precision() {
        let position = [0.1 + 0.2, 1.0 / 3.0, 4.0 / 7.0];
        let config =
            Configuration::new(vec![position], SimBox::cubic(5.0).unwrap()).unwrap();
        let parsed = from_xyz_str(&to_xyz_string(&config), true).unwrap();
        assert_eq!(parsed.positions[0], position);
    }

    #[test]
    fn huge_declared_count_is_a_mismatch() {
        let err = from_xyz_str("18446744073709551615\n# boxdims 1 1 1\nX 0 0 0\n", true)
            .unwrap_err();
        assert_eq!(err.info().code, "xyz-count");
        assert_eq!(err.info().context["found"], "1");
    }
}
