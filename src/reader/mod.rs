//! Trace artifact reader.
//!
//! Loads a finalized artifact of either variant back into memory. Used by
//! the `validate` command and by tests that check what the recorder wrote.

pub mod validate;

pub use validate::{validate_artifact, ValidationReport};

use crate::recorder::event::{CallEvent, MethodRecord};
use crate::utils::config::{
    TraceFormat, DATA_ENTRY, DURATION_MARKER, HEADER_ENTRY, METHODS_ENTRY, METHODS_MARKER,
    THREADS_MARKER,
};
use crate::utils::error::ReadError;
use log::debug;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use zip::ZipArchive;

const ZIP_MAGIC: [u8; 4] = *b"PK\x03\x04";

/// A finalized trace, fully loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceArtifact {
    pub format: TraceFormat,

    /// Event records in write order
    pub events: Vec<CallEvent>,

    /// Method table as stored (order not significant)
    pub methods: Vec<MethodRecord>,

    pub thread_ids: Vec<u64>,

    pub duration_nanos: u64,
}

impl TraceArtifact {
    /// Name of `method_id`, if the table has it
    pub fn method_name(&self, method_id: u32) -> Option<&str> {
        self.methods
            .iter()
            .find(|m| m.id == method_id)
            .map(|m| m.name.as_str())
    }

    /// Events whose method is `name`
    pub fn events_for(&self, name: &str) -> Vec<CallEvent> {
        let Some(id) = self.methods.iter().find(|m| m.name == name).map(|m| m.id) else {
            return Vec::new();
        };
        self.events
            .iter()
            .filter(|e| e.method_id == id)
            .copied()
            .collect()
    }
}

/// Read an artifact, detecting its variant from the leading bytes
///
/// **Public** - main entry point for reading traces
///
/// # Errors
/// * `ReadError::Io` - file could not be read
/// * `ReadError::Archive` - container variant is not a valid archive
/// * `ReadError::Malformed` / `ReadError::MissingSection` - bad content
pub fn read_trace(path: impl AsRef<Path>) -> Result<TraceArtifact, ReadError> {
    let path = path.as_ref();
    debug!("Reading trace from: {}", path.display());

    let mut file = File::open(path)?;
    let mut magic = [0u8; 4];
    let is_container = match file.read_exact(&mut magic) {
        Ok(()) => magic == ZIP_MAGIC,
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => false,
        Err(e) => return Err(e.into()),
    };
    file.seek(SeekFrom::Start(0))?;

    let artifact = if is_container {
        read_container(file)?
    } else {
        read_text(BufReader::new(file))?
    };

    debug!(
        "Trace loaded: {} events, {} methods, {} threads",
        artifact.events.len(),
        artifact.methods.len(),
        artifact.thread_ids.len()
    );

    Ok(artifact)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Events,
    Methods,
    Threads,
    Duration,
    Done,
}

/// Parse the plain delimited-text variant
pub fn read_text<R: BufRead>(input: R) -> Result<TraceArtifact, ReadError> {
    let mut section = Section::Events;
    let mut events = Vec::new();
    let mut methods = Vec::new();
    let mut thread_ids = Vec::new();
    let mut duration_nanos = None;

    for (index, line) in input.lines().enumerate() {
        let line = line?;
        let line_no = index + 1;

        match line.as_str() {
            METHODS_MARKER if section == Section::Events => {
                section = Section::Methods;
                continue;
            }
            THREADS_MARKER if section == Section::Methods => {
                section = Section::Threads;
                continue;
            }
            DURATION_MARKER if section == Section::Threads => {
                section = Section::Duration;
                continue;
            }
            _ => {}
        }

        match section {
            Section::Events => events.push(parse_event(&line, "data", line_no)?),
            Section::Methods => methods.push(parse_method(&line, "methods", line_no)?),
            Section::Threads => thread_ids.extend(parse_thread_ids(&line, '|', line_no)?),
            Section::Duration => {
                duration_nanos = Some(parse_field(line.trim(), "duration", line_no)?);
                section = Section::Done;
            }
            Section::Done if line.trim().is_empty() => {}
            Section::Done => {
                return Err(malformed("duration", line_no, "unexpected trailing content"))
            }
        }
    }

    let duration_nanos = match section {
        Section::Events | Section::Methods => {
            return Err(ReadError::MissingSection(match section {
                Section::Events => "methods",
                _ => "threads",
            }))
        }
        _ => duration_nanos.ok_or(ReadError::MissingSection("duration"))?,
    };

    Ok(TraceArtifact {
        format: TraceFormat::Text,
        events,
        methods,
        thread_ids,
        duration_nanos,
    })
}

/// Parse the zip container variant
pub fn read_container<R: Read + Seek>(input: R) -> Result<TraceArtifact, ReadError> {
    let mut archive = ZipArchive::new(input)?;

    let data = read_entry(&mut archive, DATA_ENTRY)?;
    let events = data
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.is_empty())
        .map(|(i, line)| parse_event(line, "data", i + 1))
        .collect::<Result<Vec<_>, _>>()?;

    let table = read_entry(&mut archive, METHODS_ENTRY)?;
    let methods = table
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.is_empty())
        .map(|(i, line)| parse_method(line, "methods", i + 1))
        .collect::<Result<Vec<_>, _>>()?;

    let header = read_entry(&mut archive, HEADER_ENTRY)?;
    let mut header_lines = header.lines();
    let thread_ids = parse_thread_ids(header_lines.next().unwrap_or(""), ';', 1)?;
    let duration_nanos = match header_lines.next() {
        Some(line) => parse_field(line.trim(), "header", 2)?,
        None => return Err(ReadError::MissingSection("duration")),
    };

    Ok(TraceArtifact {
        format: TraceFormat::Container,
        events,
        methods,
        thread_ids,
        duration_nanos,
    })
}

fn read_entry<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &'static str,
) -> Result<String, ReadError> {
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => return Err(ReadError::MissingSection(name)),
        Err(e) => return Err(e.into()),
    };
    let mut content = String::new();
    entry.read_to_string(&mut content)?;
    Ok(content)
}

fn parse_event(line: &str, section: &'static str, line_no: usize) -> Result<CallEvent, ReadError> {
    let fields: Vec<&str> = line.split('|').collect();
    if fields.len() != 5 {
        return Err(malformed(
            section,
            line_no,
            format!("expected 5 fields, found {}", fields.len()),
        ));
    }

    Ok(CallEvent {
        thread_id: parse_field(fields[0], section, line_no)?,
        start_offset: parse_field(fields[1], section, line_no)?,
        elapsed_nanos: parse_field(fields[2], section, line_no)?,
        method_id: parse_field(fields[3], section, line_no)?,
        depth: parse_field(fields[4], section, line_no)?,
    })
}

fn parse_method(line: &str, section: &'static str, line_no: usize) -> Result<MethodRecord, ReadError> {
    // Names may themselves contain '|'
    let (id, name) = line
        .split_once('|')
        .ok_or_else(|| malformed(section, line_no, "expected 'id|name'"))?;

    Ok(MethodRecord {
        id: parse_field(id, section, line_no)?,
        name: name.to_string(),
    })
}

fn parse_thread_ids(line: &str, separator: char, line_no: usize) -> Result<Vec<u64>, ReadError> {
    line.split(separator)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| parse_field(s, "threads", line_no))
        .collect()
}

fn parse_field<T>(value: &str, section: &'static str, line_no: usize) -> Result<T, ReadError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e: T::Err| malformed(section, line_no, format!("'{}': {}", value, e)))
}

fn malformed(section: &'static str, line: usize, reason: impl Into<String>) -> ReadError {
    ReadError::Malformed {
        section,
        line,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    const SAMPLE: &str = "3|0|100|0|1\n3|10|20|1|2\nmethods:\n0|a\n1|pkg.B.run(int|int)\nthreads:\n3\nduration:\n100\n";

    #[test]
    fn test_read_text_sections() {
        let artifact = read_text(Cursor::new(SAMPLE)).unwrap();

        assert_eq!(artifact.events.len(), 2);
        assert_eq!(artifact.events[1].depth, 2);
        assert_eq!(artifact.method_name(1), Some("pkg.B.run(int|int)"));
        assert_eq!(artifact.thread_ids, vec![3]);
        assert_eq!(artifact.duration_nanos, 100);
        assert_eq!(artifact.events_for("a").len(), 1);
        assert!(artifact.events_for("missing").is_empty());
    }

    #[test]
    fn test_read_text_missing_finalization() {
        let result = read_text(Cursor::new("1|0|5|0|1\n"));
        assert!(matches!(result, Err(ReadError::MissingSection("methods"))));
    }

    #[test]
    fn test_read_text_missing_duration() {
        let result = read_text(Cursor::new("methods:\nthreads:\n\nduration:\n"));
        assert!(matches!(result, Err(ReadError::MissingSection("duration"))));
    }

    #[test]
    fn test_read_text_bad_event_line() {
        let result = read_text(Cursor::new("1|0|5|0\nmethods:\nthreads:\nduration:\n0\n"));
        assert!(matches!(
            result,
            Err(ReadError::Malformed { section: "data", line: 1, .. })
        ));
    }

    #[test]
    fn test_read_text_non_numeric_field() {
        let result = read_text(Cursor::new("1|x|5|0|1\nmethods:\nthreads:\nduration:\n0\n"));
        assert!(matches!(result, Err(ReadError::Malformed { .. })));
    }
}
