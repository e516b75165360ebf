use crate::migration::Direction;
use crate::source::error::{SourceError, SourceErrorKind};

use std::fs;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};


/// Marker that introduces a section, e.g. `-- +migrate UP`.
pub const MARKER_PREFIX: &str = "-- +migrate";
pub const EXTENSION: &str = "sql";


/// Extract version and name from a filename: "000001_create_users.sql" -> (1, "create_users")
pub fn parse_filename(file_name: &str) -> Result<(u64, String), SourceError> {
    let stem = match file_name.rsplit_once('.') {
        Some((stem, ext)) if ext.eq_ignore_ascii_case(EXTENSION) => stem,
        _ => file_name,
    };

    let (prefix, name) = match stem.split_once('_') {
        Some(parts) => parts,
        None => return Err(SourceError::new(SourceErrorKind::InvalidFilename(file_name.to_string()))),
    };

    if name.is_empty() {
        return Err(SourceError::new(SourceErrorKind::InvalidFilename(file_name.to_string())))
    }

    if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_digit()) {
        return Err(SourceError::new(SourceErrorKind::InvalidVersionNumber(file_name.to_string())))
    }

    // Versions are stored as BIGINT markers.
    let version = prefix.parse::<u64>()
        .ok()
        .filter(|v| i64::try_from(*v).is_ok())
        .ok_or_else(|| SourceError::new(SourceErrorKind::InvalidVersionNumber(file_name.to_string())))?;

    Ok((version, name.to_string()))
}

/// Which section a marker line opens, if the line is a marker at all.
fn marker_direction(line: &str) -> Option<Direction> {
    let rest = line.trim().strip_prefix(MARKER_PREFIX)?;
    match rest.trim().to_ascii_lowercase().as_str() {
        "up" => Some(Direction::Up),
        "down" => Some(Direction::Down),
        _ => None,
    }
}

/// Split a file body into its forward and reverse sections.
/// Text before the first marker belongs to neither.
pub fn parse_sections(body: &str) -> (Option<String>, Option<String>) {
    let mut up: Option<String> = None;
    let mut down: Option<String> = None;
    let mut current: Option<Direction> = None;

    for line in body.lines() {
        if let Some(direction) = marker_direction(line) {
            let section = match direction {
                Direction::Up => &mut up,
                _ => &mut down,
            };
            section.get_or_insert_with(String::new);
            current = Some(direction);
            continue;
        }

        let section = match current {
            Some(Direction::Up) => &mut up,
            Some(_) => &mut down,
            None => continue,
        };
        if let Some(text) = section.as_mut() {
            text.push_str(line);
            text.push('\n');
        }
    }

    let tidy = |s: String| s.trim().to_string();
    (up.map(tidy), down.map(tidy))
}


#[derive(Debug, Clone)]
pub struct MigrationFile {
    pub version: u64,
    pub name: String,
    pub path: PathBuf,
    up: Option<String>,
    down: Option<String>,
}

impl MigrationFile {
    pub fn new(version: u64, name: &str, path: PathBuf, body: &str) -> Self {
        let (up, down) = parse_sections(body);

        MigrationFile { version, name: name.to_string(), path, up, down }
    }

    pub fn from_file(path: &Path) -> Result<Self, SourceError> {
        let file_name = path
            .file_name()
            .and_then(|s| s.to_str())
            .ok_or_else(|| SourceError::new(SourceErrorKind::InvalidFilename(path.display().to_string())))?;

        let (version, name) = parse_filename(file_name)?;

        let body = fs::read_to_string(path)
            .map_err(|source| SourceError::new(SourceErrorKind::Io { path: path.to_path_buf(), source }))?;

        Ok(MigrationFile::new(version, &name, path.to_path_buf(), &body))
    }

    /// Section text for a direction, `None` when absent or blank.
    pub fn section(&self, direction: &Direction) -> Option<&str> {
        let section = match direction {
            Direction::Up => self.up.as_deref(),
            Direction::Down => self.down.as_deref(),
            Direction::None => None,
        };
        section.filter(|s| !s.trim().is_empty())
    }

    pub fn read(&self, direction: Direction) -> Result<SectionReader, SourceError> {
        match self.section(&direction) {
            Some(text) => Ok(SectionReader::new(text)),
            None => Err(SourceError::new(SourceErrorKind::EmptySection {
                version: self.version,
                name: self.name.clone(),
                direction,
            })),
        }
    }
}


/// Content handle returned by section reads.
/// In-memory today; `close` exists so streaming backends can release resources.
#[derive(Debug)]
pub struct SectionReader {
    inner: Cursor<Vec<u8>>,
}

impl SectionReader {
    pub fn new(text: &str) -> Self {
        SectionReader { inner: Cursor::new(text.as_bytes().to_vec()) }
    }

    pub fn into_string(self) -> String {
        String::from_utf8_lossy(&self.inner.into_inner()).into_owned()
    }

    pub fn close(self) {}
}

impl Read for SectionReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}
