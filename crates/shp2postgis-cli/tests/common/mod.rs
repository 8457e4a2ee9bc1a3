//! Shared fixtures for CLI tests.
//!
//! Writes a small but complete polygon shapefile (`.shp`, `.shx`, `.dbf`,
//! `.prj`) so the same fixture works for header inspection and for real
//! ogr2ogr loads.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

const WGS84_PRJ: &str = r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#;

const NAME_FIELD_LEN: u8 = 20;

/// Writes `count` unit-square polygons named `station_<n>` next to each
/// other, and returns the `.shp` path.
pub fn write_polygon_shapefile(dir: &Path, stem: &str, count: u32) -> PathBuf {
    let squares: Vec<[(f64, f64); 5]> = (0..count)
        .map(|n| {
            let x = 4.0 + f64::from(n);
            let y = 52.0;
            // Outer rings are clockwise in shapefiles.
            [(x, y), (x, y + 1.0), (x + 1.0, y + 1.0), (x + 1.0, y), (x, y)]
        })
        .collect();

    let record_content_len = 4 + 32 + 4 + 4 + 4 + 5 * 16;
    let record_len = 8 + record_content_len;
    let shp_len = 100 + squares.len() * record_len;
    let shx_len = 100 + squares.len() * 8;

    let bbox = if squares.is_empty() {
        [0.0; 4]
    } else {
        [4.0, 52.0, 4.0 + f64::from(count), 53.0]
    };

    let mut shp = header(shp_len, bbox);
    let mut shx = header(shx_len, bbox);
    for (i, ring) in squares.iter().enumerate() {
        let offset = 100 + i * record_len;
        shx.extend_from_slice(&words(offset).to_be_bytes());
        shx.extend_from_slice(&words(record_content_len).to_be_bytes());

        shp.extend_from_slice(&(i32::try_from(i).unwrap() + 1).to_be_bytes());
        shp.extend_from_slice(&words(record_content_len).to_be_bytes());
        shp.extend_from_slice(&5_i32.to_le_bytes());
        let (x0, y0) = ring[0];
        for v in [x0, y0, x0 + 1.0, y0 + 1.0] {
            shp.extend_from_slice(&v.to_le_bytes());
        }
        shp.extend_from_slice(&1_i32.to_le_bytes()); // parts
        shp.extend_from_slice(&5_i32.to_le_bytes()); // points
        shp.extend_from_slice(&0_i32.to_le_bytes()); // first part starts at 0
        for (x, y) in ring {
            shp.extend_from_slice(&x.to_le_bytes());
            shp.extend_from_slice(&y.to_le_bytes());
        }
    }

    let shp_path = dir.join(format!("{stem}.shp"));
    fs::write(&shp_path, shp).unwrap();
    fs::write(dir.join(format!("{stem}.shx")), shx).unwrap();
    fs::write(dir.join(format!("{stem}.dbf")), dbf(count)).unwrap();
    fs::write(dir.join(format!("{stem}.prj")), WGS84_PRJ).unwrap();
    shp_path
}

fn words(bytes: usize) -> i32 {
    i32::try_from(bytes / 2).unwrap()
}

fn header(length_bytes: usize, bbox: [f64; 4]) -> Vec<u8> {
    let mut bytes = vec![0u8; 100];
    bytes[0..4].copy_from_slice(&9994_i32.to_be_bytes());
    bytes[24..28].copy_from_slice(&words(length_bytes).to_be_bytes());
    bytes[28..32].copy_from_slice(&1000_i32.to_le_bytes());
    bytes[32..36].copy_from_slice(&5_i32.to_le_bytes());
    for (i, v) in bbox.iter().enumerate() {
        bytes[36 + i * 8..44 + i * 8].copy_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// dBase III table with a single `NAME` character field.
fn dbf(count: u32) -> Vec<u8> {
    let header_len: u16 = 32 + 32 + 1;
    let record_len: u16 = 1 + u16::from(NAME_FIELD_LEN);

    let mut bytes = vec![0u8; 32];
    bytes[0] = 0x03;
    bytes[1..4].copy_from_slice(&[124, 1, 1]); // 2024-01-01
    bytes[4..8].copy_from_slice(&count.to_le_bytes());
    bytes[8..10].copy_from_slice(&header_len.to_le_bytes());
    bytes[10..12].copy_from_slice(&record_len.to_le_bytes());

    let mut field = [0u8; 32];
    field[..4].copy_from_slice(b"NAME");
    field[11] = b'C';
    field[16] = NAME_FIELD_LEN;
    bytes.extend_from_slice(&field);
    bytes.push(0x0D);

    for n in 1..=count {
        bytes.push(b' ');
        let name = format!("station_{n:<width$}", width = usize::from(NAME_FIELD_LEN) - 8);
        bytes.extend_from_slice(&name.as_bytes()[..usize::from(NAME_FIELD_LEN)]);
    }
    bytes.push(0x1A);
    bytes
}
