//! NASADEM tile directory as an elevation source.

use crate::{ElevationGrid, ElevationSource, GridGeometry, SourceError};
use dashmap::DashMap;
use geo::geometry::Coord;
use log::debug;
use nasadem::{NasademError, Tile, VOID};
use rayon::prelude::*;
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

/// Floating point type used for tile lookup.
pub type C = f64;

pub struct Tiles {
    /// Directory containing NASADEM HGT tile files.
    tile_dir: PathBuf,

    /// How to load tiles (in-memory or mapped).
    tile_mode: TileMode,

    /// Tiles which have been loaded on demand, keyed by south-west
    /// corner.
    tiles: DashMap<Coord<i16>, Arc<Tile>>,
}

impl Tiles {
    pub fn new(tile_dir: PathBuf, tile_mode: TileMode) -> Result<Self, SourceError> {
        let mut has_height_files = false;

        // Fail early if tile_dir doesn't hold a single `hgt` file.
        for entry in std::fs::read_dir(&tile_dir)? {
            let path = entry?.path();
            let ext = path.extension().and_then(std::ffi::OsStr::to_str);
            if ext.is_some_and(|ext| ext.eq_ignore_ascii_case("hgt")) {
                has_height_files = true;
                break;
            }
        }

        if has_height_files {
            Ok(Self {
                tile_dir,
                tile_mode,
                tiles: DashMap::new(),
            })
        } else {
            Err(SourceError::Path(tile_dir))
        }
    }

    /// Returns the tile containing `coord`.
    ///
    /// `Tiles` will attempt to fetch the tile from disk if it doesn't
    /// already have it in memory.
    pub fn get(&self, coord: Coord<C>) -> Result<Arc<Tile>, SourceError> {
        let sw_corner = nasadem::sw_corner(coord);
        if let Some(tile) = self.tiles.get(&sw_corner) {
            return Ok(Arc::clone(tile.value()));
        }
        self.tiles
            .entry(sw_corner)
            .or_try_insert_with(|| self.load_tile(sw_corner).map(Arc::new))
            .map(|r| Arc::clone(r.value()))
    }

    /// Returns the elevation, in meters, nearest to `coord`.
    pub fn elevation(&self, coord: Coord<C>) -> Result<i16, SourceError> {
        match self.get(coord)?.get(coord) {
            Some(elevation) if elevation != VOID => Ok(elevation),
            _ => Err(SourceError::Void {
                lat: coord.y,
                lon: coord.x,
            }),
        }
    }
}

impl ElevationSource for Tiles {
    fn fetch(&self, geometry: &GridGeometry) -> Result<ElevationGrid, SourceError> {
        let (rows, cols) = geometry.dimensions();
        let now = std::time::Instant::now();
        let samples = (0..rows * cols)
            .into_par_iter()
            .map(|idx| {
                let coord = geometry.cell_to_latlon(idx / cols, idx % cols);
                self.elevation(coord).map(f64::from)
            })
            .collect::<Result<Vec<f64>, SourceError>>()?;
        debug!(
            "fetched {rows}x{cols} grid from {} tiles in {:?}",
            self.tiles.len(),
            now.elapsed()
        );
        Ok(ElevationGrid::from_samples(*geometry, samples)?)
    }
}

/// Private API.
impl Tiles {
    fn load_tile(&self, sw_corner: Coord<i16>) -> Result<Tile, SourceError> {
        let tile_path = {
            let file_name = nasadem::file_name(sw_corner);
            let mut tile_path: PathBuf = [&self.tile_dir, Path::new(&file_name)].iter().collect();
            if !tile_path.exists() {
                let file_name = file_name.to_lowercase();
                tile_path = [&self.tile_dir, Path::new(&file_name)].iter().collect();
            }
            tile_path
        };
        debug!("loading {tile_path:?}");
        let tile = match self.tile_mode {
            TileMode::InMem => Tile::load(&tile_path),
            TileMode::MemMap => Tile::memmap(&tile_path),
        };
        match tile {
            Ok(tile) => Ok(tile),
            Err(NasademError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                Err(SourceError::MissingTile(tile_path))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// How to handle tile.
///
/// The trade off between loading tile data into memory versus memory
/// mapping is not obvious, and you should measure both before
/// deciding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TileMode {
    /// Parse tile and load into memory.
    ///
    /// Note that this can consume gigabytes of RAM when loading many
    /// tiles.
    InMem,

    /// Memory map file contents.
    #[default]
    MemMap,
}

#[cfg(test)]
mod tests {
    use super::{Coord, ElevationSource, SourceError, TileMode, Tiles};
    use crate::GridGeometry;
    use byteorder::{BigEndian as BE, WriteBytesExt};
    use std::{
        fs::File,
        io::{BufWriter, Write},
        path::Path,
    };
    use tempfile::TempDir;

    const SIDE: usize = 1201;

    /// Writes a 3 arcsecond tile rising 1 m per sample eastward from
    /// `base` meters.
    fn write_tile(dir: &Path, name: &str, base: i16) {
        let mut wtr = BufWriter::new(File::create(dir.join(name)).unwrap());
        for _y in 0..SIDE {
            for x in 0..SIDE {
                wtr.write_i16::<BE>(base + i16::try_from(x).unwrap()).unwrap();
            }
        }
        wtr.flush().unwrap();
    }

    fn tile_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        write_tile(dir.path(), "N44W072.hgt", 100);
        write_tile(dir.path(), "n44w071.hgt", 2000);
        dir
    }

    #[test]
    fn test_empty_dir_is_rejected() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Tiles::new(dir.path().to_owned(), TileMode::MemMap),
            Err(SourceError::Path(_))
        ));
    }

    #[test]
    fn test_elevation() {
        let dir = tile_dir();
        for mode in [TileMode::InMem, TileMode::MemMap] {
            let tiles = Tiles::new(dir.path().to_owned(), mode).unwrap();
            let west_edge = Coord { x: -72.0, y: 44.5 };
            assert_eq!(tiles.elevation(west_edge).unwrap(), 100);
            let midway = Coord { x: -71.5, y: 44.5 };
            assert_eq!(tiles.elevation(midway).unwrap(), 700);
            // Lower-case file names are found too.
            let next_tile = Coord { x: -70.5, y: 44.5 };
            assert_eq!(tiles.elevation(next_tile).unwrap(), 2600);
        }
    }

    #[test]
    fn test_missing_tile_is_an_error() {
        let dir = tile_dir();
        let tiles = Tiles::new(dir.path().to_owned(), TileMode::MemMap).unwrap();
        let south_pole = Coord { x: 0.0, y: -89.5 };
        assert!(matches!(
            tiles.elevation(south_pole),
            Err(SourceError::MissingTile(_))
        ));
    }

    #[test]
    fn test_fetch() {
        let dir = tile_dir();
        let tiles = Tiles::new(dir.path().to_owned(), TileMode::MemMap).unwrap();
        let center = Coord { x: -71.5, y: 44.5 };
        let geometry = GridGeometry::around(center, 900.0, 90.0).unwrap();
        let grid = tiles.fetch(&geometry).unwrap();
        assert_eq!(grid.dimensions(), (21, 21));
        let (row, col) = grid.latlon_to_cell(center).unwrap();
        assert_eq!(grid.elevation_at(row, col).unwrap(), 700.0);
        // Terrain rises eastward.
        assert!(grid.elevation_at(row, 20).unwrap() > grid.elevation_at(row, 0).unwrap());
        assert_eq!(grid.elevation_at(0, col), grid.elevation_at(20, col));
    }

    #[test]
    fn test_fetch_across_missing_tile() {
        let dir = tile_dir();
        let tiles = Tiles::new(dir.path().to_owned(), TileMode::InMem).unwrap();
        // Straddles the southern edge of the available tiles.
        let geometry = GridGeometry::around(Coord { x: -71.5, y: 44.0 }, 500.0, 90.0).unwrap();
        assert!(matches!(
            tiles.fetch(&geometry),
            Err(SourceError::MissingTile(_))
        ));
    }
}
