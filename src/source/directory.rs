use crate::migration::Direction;
use crate::source::error::{SourceError, SourceErrorKind};
use crate::source::file::{MigrationFile, SectionReader, EXTENSION};
use crate::source::MigrationSource;

use std::collections::BTreeMap;
use std::fs;
use std::ops::Bound::{Excluded, Unbounded};
use std::path::{Path, PathBuf};


/// Migration source backed by a directory of single-file migrations.
/// The index is built once by `load` and never changes afterwards.
#[derive(Debug, Clone)]
pub struct SingleFileSource {
    path: PathBuf,
    index: BTreeMap<u64, MigrationFile>,
}

impl SingleFileSource {
    pub fn new(path: PathBuf, files: Vec<MigrationFile>) -> Result<Self, SourceError> {
        let mut index: BTreeMap<u64, MigrationFile> = BTreeMap::new();

        for file in files {
            if let Some(first) = index.get(&file.version) {
                return Err(SourceError::new(SourceErrorKind::DuplicateVersion {
                    version: file.version,
                    first: display_name(&first.path),
                    second: display_name(&file.path),
                }))
            }
            index.insert(file.version, file);
        }

        Ok(SingleFileSource { path, index })
    }

    /// Scan `directory` for `<version>_<name>.sql` files.
    /// Any unparsable filename or duplicated version fails the whole load.
    pub fn load(directory: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = directory.as_ref();
        if !path.is_dir() {
            return Err(SourceError::new(SourceErrorKind::InvalidDirectory(path.to_path_buf())))
        }

        let io_error = |source: std::io::Error| SourceError::new(SourceErrorKind::Io { path: path.to_path_buf(), source });

        let mut candidates = fs::read_dir(path)
            .map_err(io_error)?
            .map(|entry| entry.map(|e| e.path()).map_err(io_error))
            .collect::<Result<Vec<PathBuf>, SourceError>>()?;
        // Sorted so duplicate reports are stable across platforms.
        candidates.sort();

        let mut files = Vec::new();
        for candidate in candidates {
            if !candidate.is_file() {
                tracing::debug!("Skipping non-file: {:?}", candidate);
                continue;
            }

            let file_name = candidate.file_name().and_then(|s| s.to_str()).unwrap_or_default();
            if file_name.starts_with('.') {
                tracing::debug!("Skipping hidden file: {:?}", candidate);
                continue;
            }
            if !candidate.extension().and_then(|s| s.to_str()).is_some_and(|ext| ext.eq_ignore_ascii_case(EXTENSION)) {
                tracing::debug!("Skipping {:?}: not a .{} file", candidate, EXTENSION);
                continue;
            }

            files.push(MigrationFile::from_file(&candidate)?);
        }

        let source = SingleFileSource::new(path.to_path_buf(), files)?;
        tracing::debug!("Loaded {} migration(s) from {:?}", source.len(), path);

        Ok(source)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn get(&self, version: u64) -> Option<&MigrationFile> {
        self.index.get(&version)
    }

    pub fn contains(&self, version: u64) -> bool {
        self.index.contains_key(&version)
    }

    pub fn latest(&self) -> Option<u64> {
        self.index.keys().next_back().copied()
    }

    fn read(&self, version: u64, direction: Direction) -> Result<(SectionReader, String), SourceError> {
        let file = self.get(version)
            .ok_or_else(|| SourceError::new(SourceErrorKind::NotFound(version)))?;

        Ok((file.read(direction)?, file.name.clone()))
    }
}

impl MigrationSource for SingleFileSource {
    fn first(&self) -> Result<Option<u64>, SourceError> {
        Ok(self.index.keys().next().copied())
    }

    fn next(&self, version: u64) -> Result<Option<u64>, SourceError> {
        Ok(self.index.range((Excluded(version), Unbounded)).next().map(|(v, _)| *v))
    }

    fn read_up(&self, version: u64) -> Result<(SectionReader, String), SourceError> {
        self.read(version, Direction::Up)
    }

    fn read_down(&self, version: u64) -> Result<(SectionReader, String), SourceError> {
        self.read(version, Direction::Down)
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string())
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::versions;
    use std::io::Read;
    use tempfile::TempDir;

    const BODY: &str = "-- +migrate UP\nCREATE TABLE t (id INT);\n\n-- +migrate DOWN\nDROP TABLE t;\n";

    fn make_dir(files: &[(&str, &str)]) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, body) in files {
            fs::write(dir.path().join(name), body).unwrap();
        }
        dir
    }

    #[test]
    fn load_orders_versions_strictly_increasing() {
        let dir = make_dir(&[
            ("000010_ten.sql", BODY),
            ("000002_two.sql", BODY),
            ("000001_one.sql", BODY),
            ("000005_five.sql", BODY),
        ]);
        let source = SingleFileSource::load(dir.path()).unwrap();

        let found = versions(&source).collect::<Result<Vec<u64>, SourceError>>().unwrap();
        assert_eq!(found, vec![1, 2, 5, 10]);

        // Restarting traversal yields the same order.
        let again = versions(&source).collect::<Result<Vec<u64>, SourceError>>().unwrap();
        assert_eq!(found, again);
    }

    #[test]
    fn first_and_next_traversal() {
        let dir = make_dir(&[("000001_one.sql", BODY), ("000003_three.sql", BODY)]);
        let source = SingleFileSource::load(dir.path()).unwrap();

        assert_eq!(source.first().unwrap(), Some(1));
        assert_eq!(source.next(1).unwrap(), Some(3));
        assert_eq!(source.next(2).unwrap(), Some(3));
        assert_eq!(source.next(3).unwrap(), None);
        assert_eq!(source.latest(), Some(3));
    }

    #[test]
    fn empty_directory_has_no_first() {
        let dir = make_dir(&[]);
        let source = SingleFileSource::load(dir.path()).unwrap();

        assert!(source.is_empty());
        assert_eq!(source.first().unwrap(), None);
    }

    #[test]
    fn skips_other_entries() {
        let dir = make_dir(&[
            ("000001_one.sql", BODY),
            ("README.md", "docs"),
            (".000002_hidden.sql", BODY),
        ]);
        fs::create_dir(dir.path().join("000003_nested")).unwrap();

        let source = SingleFileSource::load(dir.path()).unwrap();
        assert_eq!(source.len(), 1);
    }

    #[test]
    fn extension_match_ignores_case() {
        let dir = make_dir(&[("000001_one.sql", BODY), ("000002_two.SQL", BODY), ("000003_three.Sql", BODY)]);
        let source = SingleFileSource::load(dir.path()).unwrap();

        let found = versions(&source).collect::<Result<Vec<u64>, SourceError>>().unwrap();
        assert_eq!(found, vec![1, 2, 3]);
        assert_eq!(source.get(2).unwrap().name, "two");
    }

    #[test]
    fn load_failures_are_fatal() {
        let missing = SingleFileSource::load("/nonexistent/migrations/path").unwrap_err();
        assert!(matches!(missing.kind, SourceErrorKind::InvalidDirectory(_)));

        let dir = make_dir(&[("000001_one.sql", BODY), ("oops_two.sql", BODY)]);
        let bad = SingleFileSource::load(dir.path()).unwrap_err();
        assert!(matches!(bad.kind, SourceErrorKind::InvalidVersionNumber(_)), "Unexpected error: {}", bad);

        let dir = make_dir(&[("000001_one.sql", BODY), ("1_again.sql", BODY)]);
        let dup = SingleFileSource::load(dir.path()).unwrap_err();
        match dup.kind {
            SourceErrorKind::DuplicateVersion { version, first, second } => {
                assert_eq!(version, 1);
                assert_eq!(first, "000001_one.sql");
                assert_eq!(second, "1_again.sql");
            }
            other => panic!("Unexpected error: {other}"),
        }
    }

    #[test]
    fn read_sections_return_name() {
        let dir = make_dir(&[("000001_x.sql", "-- +migrate UP\n-- +migrate DOWN\nDROP TABLE x;\n")]);
        let source = SingleFileSource::load(dir.path()).unwrap();

        let err = source.read_up(1).unwrap_err();
        assert!(err.is_empty_section());
        assert_eq!(err.migration_name(), Some("x"));

        let (mut reader, name) = source.read_down(1).unwrap();
        let mut text = String::new();
        reader.read_to_string(&mut text).unwrap();
        reader.close();
        assert_eq!(name, "x");
        assert_eq!(text, "DROP TABLE x;");

        let missing = source.read_up(7).unwrap_err();
        assert!(matches!(missing.kind, SourceErrorKind::NotFound(7)));
    }
}
