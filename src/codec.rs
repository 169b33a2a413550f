//! Streaming binary codec for feature datasets.
//!
//! ```text
//! file   = header row{height}
//! header = <u32 LE width> <u32 LE height>
//! row    = <i32 LE value>{width}
//! ```
//!
//! Values are fixed-point: `round(f * 0x7FFFFFFF)`, which covers [-1, 1]
//! with a resolution of about 4.66e-10. Out-of-range values saturate.
//! Rows carry no identifiers; their order is the pair enumeration order.

use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::error::Error;

/// Size of the `{width, height}` header in bytes.
pub const HEADER_SIZE: usize = 8;

/// Rows are buffered in multiples of this many bytes.
const BLOCK_SIZE: usize = 4096;

const QUANT_SCALE: f64 = 2147483647.0; // 0x7FFFFFFF

/// Quantize a normalized float to the on-disk integer.
pub fn encode(value: f64) -> i32 {
    (value * QUANT_SCALE).round() as i32
}

/// Inverse of [`encode`].
pub fn decode(value: i32) -> f64 {
    value as f64 / QUANT_SCALE
}

/// Dataset dimensions as stored in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetHeader {
    pub width: u32,
    pub height: u32,
}

impl DatasetHeader {
    fn to_bytes(self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[..4].copy_from_slice(&self.width.to_le_bytes());
        bytes[4..].copy_from_slice(&self.height.to_le_bytes());
        bytes
    }

    fn from_bytes(bytes: [u8; HEADER_SIZE]) -> Self {
        Self {
            width: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            height: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        }
    }
}

/// Streaming dataset writer.
///
/// The first [`write`](Self::write) fixes the row width and writes a
/// provisional header with `height = 0`; [`end`](Self::end) flushes and
/// rewrites the header with the final height. Dropping the writer without
/// calling `end` leaves the provisional header in place.
///
/// Single producer only: the block buffer and row counter are sequential
/// state.
///
/// # Example
///
/// ```no_run
/// use glyphspace::codec::FeatureWriter;
///
/// let mut writer = FeatureWriter::create("pairs.bin")?;
/// writer.write(&[0.06, 0.5, 0.25])?;
/// let header = writer.end()?;
/// assert_eq!(header.height, 1);
/// # Ok::<(), glyphspace::Error>(())
/// ```
pub struct FeatureWriter<W: Write + Seek> {
    inner: W,
    /// Stream position of the header.
    origin: u64,
    block: Vec<u8>,
    width: Option<usize>,
    height: u32,
}

impl FeatureWriter<BufWriter<File>> {
    /// Create (or truncate) a dataset file.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, Error> {
        let file = File::create(path)?;
        Self::new(BufWriter::new(file))
    }
}

impl<W: Write + Seek> FeatureWriter<W> {
    /// Write into any seekable sink, starting at its current position.
    pub fn new(mut inner: W) -> Result<Self, Error> {
        let origin = inner.stream_position()?;
        Ok(Self {
            inner,
            origin,
            block: Vec::new(),
            width: None,
            height: 0,
        })
    }

    /// Row width, once fixed by the first write.
    pub fn width(&self) -> Option<usize> {
        self.width
    }

    /// Rows written so far.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Append one row. Every row must have the width of the first.
    pub fn write(&mut self, row: &[f64]) -> Result<(), Error> {
        let width = match self.width {
            Some(width) if width != row.len() => {
                return Err(Error::RowWidthMismatch {
                    expected: width,
                    found: row.len(),
                });
            }
            Some(width) => width,
            None => self.fix_width(row.len())?,
        };

        let row_bytes = width * 4;
        if self.block.capacity() - self.block.len() < row_bytes {
            self.flush_block()?;
        }
        for &value in row {
            self.block.extend_from_slice(&encode(value).to_le_bytes());
        }
        self.height = self.height.checked_add(1).ok_or(Error::DatasetTooLarge)?;
        Ok(())
    }

    /// Flush all rows, rewrite the header with the final height, and close.
    pub fn end(self) -> Result<DatasetHeader, Error> {
        self.finish().map(|(header, _)| header)
    }

    /// Like [`end`](Self::end), but hands the sink back.
    pub fn finish(mut self) -> Result<(DatasetHeader, W), Error> {
        if self.width.is_none() {
            // Nothing was written; leave a valid empty dataset behind.
            self.inner.write_all(&self.header().to_bytes())?;
        }
        self.flush_block()?;
        let header = self.header();
        let end = self.inner.stream_position()?;
        self.inner.seek(SeekFrom::Start(self.origin))?;
        self.inner.write_all(&header.to_bytes())?;
        self.inner.seek(SeekFrom::Start(end))?;
        self.inner.flush()?;
        Ok((header, self.inner))
    }

    fn fix_width(&mut self, width: usize) -> Result<usize, Error> {
        if width == 0 {
            return Err(Error::EmptyRow);
        }
        if u32::try_from(width).is_err() {
            return Err(Error::DatasetTooLarge);
        }
        self.width = Some(width);
        let capacity = (width * 4).div_ceil(BLOCK_SIZE) * BLOCK_SIZE;
        self.block = Vec::with_capacity(capacity);
        self.inner.write_all(&self.header().to_bytes())?;
        Ok(width)
    }

    fn flush_block(&mut self) -> Result<(), Error> {
        self.inner.write_all(&self.block)?;
        self.block.clear();
        Ok(())
    }

    fn header(&self) -> DatasetHeader {
        DatasetHeader {
            width: self.width.unwrap_or(0) as u32,
            height: self.height,
        }
    }
}

/// A dataset read back into memory, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    width: usize,
    declared_height: usize,
    requested: usize,
    rows: usize,
    data: Vec<f64>,
}

impl Dataset {
    /// Columns per row.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height recorded in the header.
    pub fn declared_height(&self) -> usize {
        self.declared_height
    }

    /// `min(limit, declared_height)`: the rows the read asked for.
    pub fn requested(&self) -> usize {
        self.requested
    }

    /// Every value present, row-major.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Rows actually present.
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// True when the file ended before the requested rows were read.
    pub fn is_truncated(&self) -> bool {
        self.rows < self.requested
    }

    pub fn row(&self, index: usize) -> Option<&[f64]> {
        if index >= self.rows {
            return None;
        }
        let start = index * self.width;
        Some(&self.data[start..start + self.width])
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        (0..self.rows).map(move |i| {
            let start = i * self.width;
            &self.data[start..start + self.width]
        })
    }
}

/// Read up to `limit` rows (all rows when `None`) from a dataset file.
pub fn read_dataset(path: impl AsRef<Path>, limit: Option<usize>) -> Result<Dataset, Error> {
    let file = File::open(path)?;
    read_from(BufReader::new(file), limit)
}

/// Read a dataset from any byte source.
///
/// A source that ends mid-dataset yields the complete rows present; a
/// trailing partial row is dropped. Only a missing header is an error.
pub fn read_from<R: Read>(mut reader: R, limit: Option<usize>) -> Result<Dataset, Error> {
    let mut header_bytes = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header_bytes)?;
    let header = DatasetHeader::from_bytes(header_bytes);

    let width = header.width as usize;
    let declared_height = header.height as usize;
    let requested = limit.map_or(declared_height, |limit| limit.min(declared_height));

    let mut data = Vec::new();
    let mut row_bytes = vec![0u8; width * 4];
    let mut rows = 0;
    while rows < requested {
        match reader.read_exact(&mut row_bytes) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        }
        data.extend(
            row_bytes
                .chunks_exact(4)
                .map(|b| decode(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))),
        );
        rows += 1;
    }
    if rows < requested {
        log::warn!(
            "dataset truncated: {} of {} requested rows present",
            rows,
            requested
        );
    }

    Ok(Dataset {
        width,
        declared_height,
        requested,
        rows,
        data,
    })
}
