//! Shapefile header inspection.
//!
//! Only the parts needed to describe a shapefile and to verify a load are
//! read: the 100-byte main file header and the feature count. Geometry
//! decoding is left to ogr2ogr.
//!
//! Header layout (ESRI Shapefile Technical Description):
//!
//! | Offset | Field         | Type   | Byte order |
//! |--------|---------------|--------|------------|
//! | 0      | File code     | i32    | Big        |
//! | 24     | File length   | i32    | Big        |
//! | 28     | Version       | i32    | Little     |
//! | 32     | Shape type    | i32    | Little     |
//! | 36     | Xmin .. Ymax  | 4×f64  | Little     |
//!
//! Lengths are counted in 16-bit words. Each index (`.shx`) record is 8 bytes.
//!
//! Records the attribute table (`.dbf`) flags as deleted are not features:
//! readers such as OGR skip them, so they are left out of the count.

use std::fmt;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::ShapefileError;
use crate::types::GeometryType;

const HEADER_LEN: u64 = 100;
const FILE_CODE: i32 = 9994;
const VERSION: i32 = 1000;
const INDEX_RECORD_LEN: u64 = 8;
const RECORD_HEADER_LEN: u64 = 8;
const DBF_HEADER_LEN: usize = 32;
const DBF_DELETED: u8 = b'*';

/// ESRI shape type stored in the file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeType {
    /// No geometry.
    Null,
    /// Point.
    Point,
    /// Line or multi-line.
    PolyLine,
    /// Polygon with one or more rings.
    Polygon,
    /// Set of points.
    MultiPoint,
    /// Point with Z.
    PointZ,
    /// PolyLine with Z.
    PolyLineZ,
    /// Polygon with Z.
    PolygonZ,
    /// MultiPoint with Z.
    MultiPointZ,
    /// Point with measure.
    PointM,
    /// PolyLine with measure.
    PolyLineM,
    /// Polygon with measure.
    PolygonM,
    /// MultiPoint with measure.
    MultiPointM,
    /// Surface patches.
    MultiPatch,
}

impl ShapeType {
    /// Decodes a header shape type code.
    #[must_use]
    pub fn from_code(code: i32) -> Option<Self> {
        let ty = match code {
            0 => ShapeType::Null,
            1 => ShapeType::Point,
            3 => ShapeType::PolyLine,
            5 => ShapeType::Polygon,
            8 => ShapeType::MultiPoint,
            11 => ShapeType::PointZ,
            13 => ShapeType::PolyLineZ,
            15 => ShapeType::PolygonZ,
            18 => ShapeType::MultiPointZ,
            21 => ShapeType::PointM,
            23 => ShapeType::PolyLineM,
            25 => ShapeType::PolygonM,
            28 => ShapeType::MultiPointM,
            31 => ShapeType::MultiPatch,
            _ => return None,
        };
        Some(ty)
    }

    /// The destination geometry type that holds every shape of this type.
    ///
    /// Shapefile polylines and polygons may have several parts, so they map
    /// to the multi types.
    #[must_use]
    pub fn geometry_type(&self) -> GeometryType {
        match self {
            ShapeType::Point | ShapeType::PointZ | ShapeType::PointM => GeometryType::Point,
            ShapeType::MultiPoint | ShapeType::MultiPointZ | ShapeType::MultiPointM => {
                GeometryType::MultiPoint
            },
            ShapeType::PolyLine | ShapeType::PolyLineZ | ShapeType::PolyLineM => {
                GeometryType::MultiLineString
            },
            ShapeType::Polygon
            | ShapeType::PolygonZ
            | ShapeType::PolygonM
            | ShapeType::MultiPatch => GeometryType::MultiPolygon,
            ShapeType::Null => GeometryType::Geometry,
        }
    }
}

impl fmt::Display for ShapeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Bounding box from the file header, in the shapefile's own CRS.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Minimum X
    pub xmin: f64,
    /// Minimum Y
    pub ymin: f64,
    /// Maximum X
    pub xmax: f64,
    /// Maximum Y
    pub ymax: f64,
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}) - ({}, {})",
            self.xmin, self.ymin, self.xmax, self.ymax
        )
    }
}

/// Summary of a shapefile.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapefileInfo {
    /// Path of the `.shp` file
    pub path: PathBuf,
    /// Shape type declared in the header
    pub shape_type: ShapeType,
    /// Number of feature records, excluding deleted ones
    pub feature_count: u64,
    /// Records flagged as deleted in the `.dbf`
    pub deleted_records: u64,
    /// Extent declared in the header
    pub bbox: BoundingBox,
    /// Whether the count came from the `.shx` index rather than a scan
    pub indexed: bool,
}

/// Reads the header and feature count of the shapefile at `path`.
///
/// The count comes from the sibling `.shx` index when present, otherwise the
/// `.shp` records are walked. Records flagged as deleted in the sibling
/// `.dbf` are subtracted.
///
/// # Errors
///
/// Returns [`ShapefileError::NotFound`] if `path` does not exist,
/// [`ShapefileError::InvalidHeader`] if either file is not a valid shapefile
/// component, and [`ShapefileError::Read`] on other I/O failures.
pub fn inspect(path: &Path) -> Result<ShapefileInfo, ShapefileError> {
    if !path.is_file() {
        return Err(ShapefileError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let mut shp = File::open(path).map_err(|source| read_error(path, source))?;
    let header = read_header(&mut shp, path)?;
    let code = i32::from_le_bytes(word(&header, 32));
    let shape_type = ShapeType::from_code(code)
        .ok_or_else(|| invalid(path, &format!("unknown shape type {code}")))?;
    let bbox = BoundingBox {
        xmin: f64::from_le_bytes(double(&header, 36)),
        ymin: f64::from_le_bytes(double(&header, 44)),
        xmax: f64::from_le_bytes(double(&header, 52)),
        ymax: f64::from_le_bytes(double(&header, 60)),
    };

    let (records, indexed) = match sibling(path, "shx") {
        Some(shx_path) => {
            debug!("Counting features from index {}", shx_path.display());
            (count_from_index(&shx_path)?, true)
        },
        None => {
            debug!("No index next to {}, scanning records", path.display());
            (count_records(&mut shp, path, file_length(&header))?, false)
        },
    };

    let deleted_records = match sibling(path, "dbf") {
        Some(dbf_path) => count_deleted(&dbf_path, records)?,
        None => 0,
    };
    if deleted_records > 0 {
        debug!("{deleted_records} of {records} record(s) are flagged as deleted");
    }

    Ok(ShapefileInfo {
        path: path.to_path_buf(),
        shape_type,
        feature_count: records - deleted_records,
        deleted_records,
        bbox,
        indexed,
    })
}

/// Finds a component file next to `path` with the given extension, in lower
/// or upper case.
fn sibling(path: &Path, extension: &str) -> Option<PathBuf> {
    [extension.to_ascii_lowercase(), extension.to_ascii_uppercase()]
        .into_iter()
        .map(|ext| path.with_extension(ext))
        .find(|candidate| candidate.is_file())
}

fn count_from_index(path: &Path) -> Result<u64, ShapefileError> {
    let mut shx = File::open(path).map_err(|source| read_error(path, source))?;
    let header = read_header(&mut shx, path)?;
    let len = file_length(&header);
    if len < HEADER_LEN || (len - HEADER_LEN) % INDEX_RECORD_LEN != 0 {
        return Err(invalid(
            path,
            &format!("index length {len} is not 100 + 8n bytes"),
        ));
    }
    Ok((len - HEADER_LEN) / INDEX_RECORD_LEN)
}

fn count_records(shp: &mut File, path: &Path, len: u64) -> Result<u64, ShapefileError> {
    let mut offset = HEADER_LEN;
    let mut count = 0;
    let mut record = [0u8; RECORD_HEADER_LEN as usize];
    while offset < len {
        if offset + RECORD_HEADER_LEN > len {
            return Err(invalid(path, &format!("truncated record at byte {offset}")));
        }
        shp.seek(SeekFrom::Start(offset))
            .and_then(|_| shp.read_exact(&mut record))
            .map_err(|source| {
                if source.kind() == io::ErrorKind::UnexpectedEof {
                    invalid(path, &format!("truncated record at byte {offset}"))
                } else {
                    read_error(path, source)
                }
            })?;
        let content_words = i32::from_be_bytes(word(&record, 4));
        let content_len = u64::try_from(content_words)
            .map_err(|_| invalid(path, &format!("negative record length at byte {offset}")))?
            * 2;
        offset += RECORD_HEADER_LEN + content_len;
        count += 1;
    }
    if offset != len {
        return Err(invalid(path, "last record runs past the end of the file"));
    }
    Ok(count)
}

/// Number of the first `records` rows of a dBase table flagged as deleted.
fn count_deleted(path: &Path, records: u64) -> Result<u64, ShapefileError> {
    let bytes = std::fs::read(path).map_err(|source| read_error(path, source))?;
    if bytes.len() < DBF_HEADER_LEN {
        return Err(invalid(path, "file is shorter than the 32-byte dBase header"));
    }
    let row_count = u64::from(u32::from_le_bytes(word(&bytes, 4)));
    let header_len = usize::from(u16::from_le_bytes([bytes[8], bytes[9]]));
    let record_len = usize::from(u16::from_le_bytes([bytes[10], bytes[11]]));
    if record_len == 0 {
        return Err(invalid(path, "dBase record length is zero"));
    }

    let deleted = bytes
        .get(header_len..)
        .unwrap_or_default()
        .chunks(record_len)
        .take(usize::try_from(row_count.min(records)).unwrap_or(usize::MAX))
        .filter(|record| record[0] == DBF_DELETED)
        .count();
    Ok(deleted as u64)
}

fn read_header(file: &mut File, path: &Path) -> Result<[u8; HEADER_LEN as usize], ShapefileError> {
    let mut header = [0u8; HEADER_LEN as usize];
    file.read_exact(&mut header).map_err(|source| {
        if source.kind() == io::ErrorKind::UnexpectedEof {
            invalid(path, "file is shorter than the 100-byte header")
        } else {
            read_error(path, source)
        }
    })?;

    let code = i32::from_be_bytes(word(&header, 0));
    if code != FILE_CODE {
        return Err(invalid(path, &format!("file code {code}, expected {FILE_CODE}")));
    }
    let version = i32::from_le_bytes(word(&header, 28));
    if version != VERSION {
        return Err(invalid(path, &format!("version {version}, expected {VERSION}")));
    }
    Ok(header)
}

/// File length from a header, in bytes. Negative lengths read as zero.
fn file_length(header: &[u8]) -> u64 {
    u64::try_from(i32::from_be_bytes(word(header, 24))).unwrap_or(0) * 2
}

fn word(bytes: &[u8], at: usize) -> [u8; 4] {
    [bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]
}

fn double(bytes: &[u8], at: usize) -> [u8; 8] {
    let mut out = [0u8; 8];
    out.copy_from_slice(&bytes[at..at + 8]);
    out
}

fn read_error(path: &Path, source: io::Error) -> ShapefileError {
    ShapefileError::Read {
        path: path.to_path_buf(),
        source,
    }
}

fn invalid(path: &Path, message: &str) -> ShapefileError {
    ShapefileError::InvalidHeader {
        path: path.to_path_buf(),
        message: message.to_string(),
    }
}
