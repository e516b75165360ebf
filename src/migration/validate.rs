use crate::source::{versions, MigrationSource, SectionReader, SourceError};

use serde::Serialize;


#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub count: usize,
    pub empty_up: usize,
    pub empty_down: usize,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.empty_up == 0 && self.empty_down == 0
    }
}

/// Count migrations and empty sections. Every section handle read here is
/// released before the next one is opened.
pub fn validate<S: MigrationSource + ?Sized>(source: &S) -> Result<ValidationReport, SourceError> {
    let mut report = ValidationReport::default();

    for version in versions(source) {
        let version = version?;
        report.count += 1;

        if !section_present(source.read_up(version))? {
            report.empty_up += 1;
        }
        if !section_present(source.read_down(version))? {
            report.empty_down += 1;
        }
    }

    Ok(report)
}

fn section_present(read: Result<(SectionReader, String), SourceError>) -> Result<bool, SourceError> {
    match read {
        Ok((reader, _)) => {
            reader.close();
            Ok(true)
        }
        Err(e) if e.is_empty_section() => Ok(false),
        Err(e) => Err(e),
    }
}
