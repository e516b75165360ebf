//! Single-file migration source.
//!
//! Each migration is one `<version>_<name>.sql` file holding both its
//! forward and reverse sections. Traversal is cursor based (`first`/`next`)
//! so other backends can serve migrations without materializing the full set.
mod directory;
mod error;
mod file;

pub use directory::SingleFileSource;
pub use error::{SourceError, SourceErrorKind};
pub use file::{parse_filename, MigrationFile, SectionReader, EXTENSION, MARKER_PREFIX};


pub trait MigrationSource {
    /// Smallest version, `None` when there are no migrations.
    fn first(&self) -> Result<Option<u64>, SourceError>;
    /// Smallest version strictly greater than `version`, `None` at the end.
    fn next(&self, version: u64) -> Result<Option<u64>, SourceError>;
    /// Forward section and migration name.
    /// An empty section fails with `EmptySection`, which still carries the name.
    fn read_up(&self, version: u64) -> Result<(SectionReader, String), SourceError>;
    fn read_down(&self, version: u64) -> Result<(SectionReader, String), SourceError>;
}


/// Lazy ascending walk over a source, built on `first`/`next`.
pub struct Versions<'a, S: MigrationSource + ?Sized> {
    source: &'a S,
    cursor: Option<u64>,
    done: bool,
}

impl<S: MigrationSource + ?Sized> Iterator for Versions<'_, S> {
    type Item = Result<u64, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let step = match self.cursor {
            None => self.source.first(),
            Some(version) => self.source.next(version),
        };

        match step {
            Ok(Some(version)) => {
                self.cursor = Some(version);
                Some(Ok(version))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

pub fn versions<S: MigrationSource + ?Sized>(source: &S) -> Versions<'_, S> {
    Versions { source, cursor: None, done: false }
}

/// Name of a migration, whether or not its forward section has content.
pub fn migration_name<S: MigrationSource + ?Sized>(source: &S, version: u64) -> Result<String, SourceError> {
    match source.read_up(version) {
        Ok((reader, name)) => {
            reader.close();
            Ok(name)
        }
        Err(e) => match e.migration_name() {
            Some(name) => Ok(name.to_string()),
            None => Err(e),
        },
    }
}
