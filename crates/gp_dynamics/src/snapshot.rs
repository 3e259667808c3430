//! Training-data persistence
//!
//! Two formats are written:
//!
//! - **Binary snapshot** for exact reload. Layout: `rows: u64`, `cols: u64`,
//!   then `rows * cols` `f64` values in row-major order, all little-endian.
//! - **Text dump** for inspection: one line per sample, sample components
//!   followed by target components, separated by single spaces. Lines are
//!   joined by `\n` without a trailing newline.

use crate::error::{DynamicsError, DynamicsResult};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use ndarray::{Array1, Array2};
use std::fs::File;
use std::io::{BufWriter, Cursor, Read, Write};
use std::path::Path;

const HEADER_LEN: usize = 16;

/// Write `data` to `path`, replacing any existing file
pub fn write_snapshot(path: impl AsRef<Path>, data: &Array2<f64>) -> DynamicsResult<()> {
    let mut out = BufWriter::new(File::create(path)?);
    out.write_u64::<LittleEndian>(data.nrows() as u64)?;
    out.write_u64::<LittleEndian>(data.ncols() as u64)?;
    for value in data.iter() {
        out.write_f64::<LittleEndian>(*value)?;
    }
    out.flush()?;
    Ok(())
}

/// Write the text dump of `samples` and their `targets` rows to `path`
pub fn write_text_dump(
    path: impl AsRef<Path>,
    samples: &[Array1<f64>],
    targets: &Array2<f64>,
) -> DynamicsResult<()> {
    let lines: Vec<String> = samples
        .iter()
        .zip(targets.rows())
        .map(|(sample, target)| {
            sample
                .iter()
                .chain(target.iter())
                .map(f64::to_string)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect();
    std::fs::write(path, lines.join("\n"))?;
    Ok(())
}

/// Read a matrix written by [`write_snapshot`]
pub fn read_snapshot(path: impl AsRef<Path>) -> DynamicsResult<Array2<f64>> {
    let mut bytes = Vec::new();
    File::open(path)?.read_to_end(&mut bytes)?;
    decode(&bytes)
}

fn decode(bytes: &[u8]) -> DynamicsResult<Array2<f64>> {
    if bytes.len() < HEADER_LEN {
        return Err(DynamicsError::Snapshot(format!(
            "file is {} bytes, shorter than the header",
            bytes.len()
        )));
    }

    let mut cursor = Cursor::new(bytes);
    let rows = cursor.read_u64::<LittleEndian>()?;
    let cols = cursor.read_u64::<LittleEndian>()?;

    let expected = usize::try_from(rows)
        .ok()
        .zip(usize::try_from(cols).ok())
        .and_then(|(r, c)| r.checked_mul(c))
        .and_then(|n| n.checked_mul(8).map(|b| (n, b)));
    let Some((count, payload)) = expected else {
        return Err(DynamicsError::Snapshot(format!(
            "header {}x{} is too large",
            rows, cols
        )));
    };
    if bytes.len() - HEADER_LEN != payload {
        return Err(DynamicsError::Snapshot(format!(
            "header declares {}x{} values ({} bytes) but payload has {} bytes",
            rows,
            cols,
            payload,
            bytes.len() - HEADER_LEN
        )));
    }

    let mut values = vec![0.0; count];
    cursor.read_f64_into::<LittleEndian>(&mut values)?;
    Array2::from_shape_vec((rows as usize, cols as usize), values)
        .map_err(|e| DynamicsError::Snapshot(e.to_string()))
}
