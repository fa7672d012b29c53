//! Line sources backing each feed

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

/// A line-oriented input stream
///
/// A source is valid until a read finds the end of the stream (or fails),
/// after which it stays invalid.
pub trait LineSource: Send {
    /// Whether more lines may be available
    fn is_valid(&self) -> bool;

    /// Read the next line into `buf` without its line terminator
    ///
    /// Returns `false` once the source is exhausted; `buf` is then empty.
    fn read_line(&mut self, buf: &mut String) -> bool;

    /// Human readable name for logs
    fn name(&self) -> String;
}

impl<S: LineSource + ?Sized> LineSource for Box<S> {
    fn is_valid(&self) -> bool {
        (**self).is_valid()
    }

    fn read_line(&mut self, buf: &mut String) -> bool {
        (**self).read_line(buf)
    }

    fn name(&self) -> String {
        (**self).name()
    }
}

/// File-backed line source
pub struct FileSource {
    path: PathBuf,
    reader: BufReader<File>,
    bytes: Vec<u8>,
    valid: bool,
}

impl FileSource {
    /// Open a feed file
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        Ok(Self {
            path,
            reader: BufReader::new(file),
            bytes: Vec::with_capacity(128),
            valid: true,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LineSource for FileSource {
    fn is_valid(&self) -> bool {
        self.valid
    }

    fn read_line(&mut self, buf: &mut String) -> bool {
        buf.clear();
        if !self.valid {
            return false;
        }

        self.bytes.clear();
        match self.reader.read_until(b'\n', &mut self.bytes) {
            Ok(0) => {
                self.valid = false;
                false
            }
            Ok(_) => {
                if self.bytes.last() == Some(&b'\n') {
                    self.bytes.pop();
                }
                // Invalid UTF-8 is kept lossily so the parser rejects just this line
                buf.push_str(&String::from_utf8_lossy(&self.bytes));
                true
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Feed read failed, closing feed");
                self.valid = false;
                false
            }
        }
    }

    fn name(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory line source for tests and fixtures
#[derive(Debug, Clone)]
pub struct MemorySource {
    name: String,
    lines: Vec<String>,
    position: usize,
    valid: bool,
}

impl MemorySource {
    pub fn new<I, L>(name: impl Into<String>, lines: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        Self {
            name: name.into(),
            lines: lines.into_iter().map(Into::into).collect(),
            position: 0,
            valid: true,
        }
    }

    /// Total number of lines held
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of lines handed out so far
    pub fn lines_read(&self) -> usize {
        self.position
    }
}

impl LineSource for MemorySource {
    fn is_valid(&self) -> bool {
        self.valid
    }

    fn read_line(&mut self, buf: &mut String) -> bool {
        buf.clear();
        match self.lines.get(self.position) {
            Some(line) if self.valid => {
                buf.push_str(line);
                self.position += 1;
                true
            }
            _ => {
                self.valid = false;
                false
            }
        }
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}
