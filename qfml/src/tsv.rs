use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::io::BufRead;

use log::warn;

use crate::progress::ByteNum;

pub const TSV_FIELD_DELIMITER: char = '\t';
const TSV_FIELD_DELIMITER_BYTE: u8 = TSV_FIELD_DELIMITER as u8;
const TSV_LINE_DELIMITER: u8 = b'\n';
const TSV_CARRIAGE_RETURN: u8 = b'\r';

/// Number of leading characters of a `<prefix><integer-id>` token that are
/// not part of the identifier.
pub const ID_TOKEN_PREFIX_LEN: usize = 2;

/// Error occurring when reading a tab-separated file.
#[derive(Debug)]
pub enum TsvReaderError {
    /// I/O error occurred when reading the file.
    IoError(std::io::Error),
    /// The line is not valid UTF-8.
    InvalidUtf8 { line: usize },
}

impl From<std::io::Error> for TsvReaderError {
    fn from(e: std::io::Error) -> Self {
        Self::IoError(e)
    }
}

impl Display for TsvReaderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TsvReaderError::IoError(e) => write!(f, "IO error: {}", e),
            TsvReaderError::InvalidUtf8 { line } => {
                write!(f, "Line {} is not valid UTF-8", line)
            }
        }
    }
}

impl Error for TsvReaderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TsvReaderError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

/// The result of a TSV reading operation.
pub type TsvResult<T> = Result<T, TsvReaderError>;

/// A single non-empty line of a TSV file.
#[derive(Debug, Clone, Copy)]
pub struct TsvLine<'a> {
    number: usize,
    text: &'a str,
    size: ByteNum,
}

impl<'a> TsvLine<'a> {
    /// 1-based line number in the file, counting the header.
    #[inline]
    #[must_use]
    pub fn number(&self) -> usize {
        self.number
    }

    #[inline]
    #[must_use]
    pub fn text(&self) -> &'a str {
        self.text
    }

    /// Number of bytes consumed from the input for this line, including
    /// any skipped lines before it.
    #[inline]
    #[must_use]
    pub fn size(&self) -> ByteNum {
        self.size
    }

    /// Returns the tab-separated fields of the line. Empty fields, such as
    /// the ones between two consecutive tabs, are skipped. There is always
    /// at least one field.
    pub fn fields(&self) -> impl Iterator<Item = &'a str> {
        self.text
            .split(TSV_FIELD_DELIMITER)
            .filter(|field| !field.is_empty())
    }
}

/// Line-oriented reader of tab-separated files with a header line.
///
/// Blank lines and lines made of tabs only are skipped. Their bytes are
/// attributed to the next returned line, or to
/// [`TsvReader::take_trailing_bytes`] once the input is exhausted.
#[derive(Debug)]
pub struct TsvReader<R> {
    reader: R,
    buffer: Vec<u8>,
    line_num: usize,
    pending_bytes: usize,
}

impl<R: BufRead> TsvReader<R> {
    /// Creates new `TsvReader` instance.
    ///
    /// # Examples
    /// ```
    /// use qfml::tsv::TsvReader;
    ///
    /// let mut reader = TsvReader::new("id\tvalue\ncell\tAB1\n".as_bytes());
    /// reader.skip_header().unwrap();
    /// let line = reader.read_line().unwrap().unwrap();
    ///
    /// assert_eq!(line.fields().collect::<Vec<_>>(), vec!["cell", "AB1"]);
    /// ```
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: Vec::with_capacity(4096),
            line_num: 0,
            pending_bytes: 0,
        }
    }

    /// Discards the first line of the file, whatever its contents. Returns
    /// the number of bytes skipped.
    pub fn skip_header(&mut self) -> TsvResult<ByteNum> {
        let bytes_read = Self::read_raw_line(&mut self.reader, &mut self.buffer)?;
        if bytes_read > 0 {
            self.line_num += 1;
        }

        Ok(ByteNum::new(bytes_read))
    }

    /// Reads the next line with at least one field, with the line
    /// terminator stripped. Returns `None` at the end of the input.
    pub fn read_line(&mut self) -> TsvResult<Option<TsvLine<'_>>> {
        let len = loop {
            let bytes_read = Self::read_raw_line(&mut self.reader, &mut self.buffer)?;
            if bytes_read == 0 {
                return Ok(None);
            }
            self.pending_bytes += bytes_read;
            self.line_num += 1;

            let len = Self::trimmed_len(&self.buffer);
            if len == 0 {
                continue;
            }
            if self.buffer[..len]
                .iter()
                .all(|&byte| byte == TSV_FIELD_DELIMITER_BYTE)
            {
                warn!("Skipping line {} without fields", self.line_num);
                continue;
            }
            break len;
        };

        let size = ByteNum::new(std::mem::take(&mut self.pending_bytes));
        let line_num = self.line_num;
        let text = std::str::from_utf8(&self.buffer[..len])
            .map_err(|_| TsvReaderError::InvalidUtf8 { line: line_num })?;

        Ok(Some(TsvLine {
            number: line_num,
            text,
            size,
        }))
    }

    /// Returns the bytes of the lines skipped since the last returned line
    /// and resets the count. Call after [`TsvReader::read_line`] returned
    /// `None` to account for trailing blank lines.
    pub fn take_trailing_bytes(&mut self) -> ByteNum {
        ByteNum::new(std::mem::take(&mut self.pending_bytes))
    }

    fn read_raw_line(reader: &mut R, buffer: &mut Vec<u8>) -> TsvResult<usize> {
        buffer.clear();
        let bytes_read = reader.read_until(TSV_LINE_DELIMITER, buffer)?;

        Ok(bytes_read)
    }

    fn trimmed_len(buffer: &[u8]) -> usize {
        let mut len = buffer.len();
        while len > 0 && matches!(buffer[len - 1], TSV_LINE_DELIMITER | TSV_CARRIAGE_RETURN) {
            len -= 1;
        }
        len
    }
}

/// Integer identifier parsed from a `<prefix><integer-id>` token.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ParsedId {
    /// The whole suffix is a valid integer.
    Valid(u32),
    /// The suffix is malformed; the value is its leading digits, or 0 if
    /// there are none.
    Lenient(u32),
}

impl ParsedId {
    #[inline]
    #[must_use]
    pub fn value(&self) -> u32 {
        match *self {
            ParsedId::Valid(value) | ParsedId::Lenient(value) => value,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_lenient(&self) -> bool {
        matches!(self, ParsedId::Lenient(_))
    }
}

/// Parses the integer suffix of a token such as `R-12`. The prefix
/// characters are discarded without being validated.
///
/// # Examples
/// ```
/// use qfml::tsv::{parse_prefixed_id, ParsedId};
///
/// assert_eq!(parse_prefixed_id("R-12"), ParsedId::Valid(12));
/// assert_eq!(parse_prefixed_id("R-7x"), ParsedId::Lenient(7));
/// assert_eq!(parse_prefixed_id("R-"), ParsedId::Lenient(0));
/// ```
#[must_use]
pub fn parse_prefixed_id(token: &str) -> ParsedId {
    let suffix = match token.get(ID_TOKEN_PREFIX_LEN..) {
        Some(suffix) => suffix,
        None => return ParsedId::Lenient(0),
    };

    if let Ok(value) = suffix.parse::<u32>() {
        if !suffix.starts_with('+') {
            return ParsedId::Valid(value);
        }
    }

    let trimmed = suffix.trim_start();
    let trimmed = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let digits_len = trimmed
        .bytes()
        .take_while(|byte| byte.is_ascii_digit())
        .count();
    let value = trimmed[..digits_len].parse::<u32>().unwrap_or(0);

    ParsedId::Lenient(value)
}
