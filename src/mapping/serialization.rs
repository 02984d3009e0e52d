//! Binary persistence for belief grids.
//!
//! Format (little-endian):
//!
//! ```text
//! magic   4 bytes  "STNV"
//! version u16      current = 1
//! width   u32
//! height  u32
//! cells   width * height * f32 log-odds, row-major
//! ```
//!
//! Loading validates magic, version and payload length; any mismatch is a
//! fatal [`StellarError::MapFile`], never a silent partial load.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use tracing::info;

use crate::error::{Result, StellarError};

use super::{BeliefGrid, FusionConfig};

const MAGIC: [u8; 4] = *b"STNV";
const VERSION: u16 = 1;

/// Write a belief grid dump to `path`, overwriting any existing file.
pub fn save<P: AsRef<Path>>(grid: &BeliefGrid, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);

    writer.write_all(&MAGIC)?;
    writer.write_all(&VERSION.to_le_bytes())?;
    writer.write_all(&(grid.width() as u32).to_le_bytes())?;
    writer.write_all(&(grid.height() as u32).to_le_bytes())?;

    for &cell in grid.cells() {
        writer.write_all(&cell.to_le_bytes())?;
    }
    writer.flush()?;

    info!(
        path = %path.display(),
        width = grid.width(),
        height = grid.height(),
        "saved belief grid"
    );
    Ok(())
}

/// Load a belief grid dump from `path`.
pub fn load<P: AsRef<Path>>(path: P, config: FusionConfig) -> Result<BeliefGrid> {
    let path = path.as_ref();
    let mut reader = BufReader::new(File::open(path)?);

    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(StellarError::MapFile(format!(
            "{}: bad magic {:?}",
            path.display(),
            magic
        )));
    }

    let mut buf2 = [0u8; 2];
    reader.read_exact(&mut buf2)?;
    let version = u16::from_le_bytes(buf2);
    if version != VERSION {
        return Err(StellarError::MapFile(format!(
            "{}: unsupported version {} (expected {})",
            path.display(),
            version,
            VERSION
        )));
    }

    let mut buf4 = [0u8; 4];
    reader.read_exact(&mut buf4)?;
    let width = u32::from_le_bytes(buf4) as usize;
    reader.read_exact(&mut buf4)?;
    let height = u32::from_le_bytes(buf4) as usize;

    if width == 0 || height == 0 || width.saturating_mul(height) > 100_000_000 {
        return Err(StellarError::MapFile(format!(
            "{}: implausible dimensions {}x{}",
            path.display(),
            width,
            height
        )));
    }

    let mut cells = Vec::with_capacity(width * height);
    for _ in 0..width * height {
        reader.read_exact(&mut buf4).map_err(|_| {
            StellarError::MapFile(format!(
                "{}: truncated payload, expected {} cells",
                path.display(),
                width * height
            ))
        })?;
        cells.push(f32::from_le_bytes(buf4));
    }

    // Trailing bytes mean the header lied about dimensions
    let mut trailing = [0u8; 1];
    if reader.read(&mut trailing)? != 0 {
        return Err(StellarError::MapFile(format!(
            "{}: trailing bytes after {} cells",
            path.display(),
            width * height
        )));
    }

    info!(
        path = %path.display(),
        width,
        height,
        "loaded belief grid"
    );
    Ok(BeliefGrid::from_raw(config, cells, width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::GridPose;
    use approx::assert_relative_eq;

    #[test]
    fn test_save_load_preserves_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("belief.map");

        let mut grid = BeliefGrid::new(40, 30, FusionConfig::default());
        grid.stamp_segment(GridPose::new(3, 5), GridPose::new(20, 5));
        grid.fuse(GridPose::new(10, 15), 0.0, 6.0, 0.0, 0.26, 20.0);

        grid.save(&path).unwrap();
        let loaded = BeliefGrid::load(&path, FusionConfig::default()).unwrap();

        assert_eq!(loaded.width(), 40);
        assert_eq!(loaded.height(), 30);
        for row in 0..30 {
            for col in 0..40 {
                assert_relative_eq!(
                    loaded.log_odds(row, col),
                    grid.log_odds(row, col),
                    epsilon = 1e-6
                );
            }
        }
    }

    #[test]
    fn test_bad_magic_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bogus.map");
        std::fs::write(&path, b"NOPE\x01\x00\x02\x00\x00\x00\x02\x00\x00\x00").unwrap();

        let err = BeliefGrid::load(&path, FusionConfig::default()).unwrap_err();
        assert!(matches!(err, StellarError::MapFile(_)));
    }

    #[test]
    fn test_truncated_payload_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.map");

        let grid = BeliefGrid::new(10, 10, FusionConfig::default());
        grid.save(&path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 8]).unwrap();

        let err = BeliefGrid::load(&path, FusionConfig::default()).unwrap_err();
        assert!(matches!(err, StellarError::MapFile(_)));
    }

    #[test]
    fn test_wrong_version_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("future.map");

        let grid = BeliefGrid::new(4, 4, FusionConfig::default());
        grid.save(&path).unwrap();
        let mut bytes = std::fs::read(&path).unwrap();
        bytes[4] = 0xFF;
        std::fs::write(&path, &bytes).unwrap();

        let err = BeliefGrid::load(&path, FusionConfig::default()).unwrap_err();
        assert!(matches!(err, StellarError::MapFile(_)));
    }
}
