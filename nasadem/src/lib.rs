//! NASADEM/SRTM elevation (`.hgt`) tiles.
//!
//! A tile covers one degree of latitude and longitude and stores a
//! square of big-endian `i16` samples, north row first. The edge rows
//! and columns are shared with the neighbouring tiles, so a 3
//! arcsecond tile is 1201 samples on a side and a 1 arcsecond tile
//! 3601.
//!
//! # References
//!
//! 1. [30-Meter SRTM Tile Downloader](https://dwtkns.com/srtm30m)
//! 1. [Archive Team](http://fileformats.archiveteam.org/index.php?title=HGT&oldid=17250)
//! 1. [SRTM Collection User Guide](https://lpdaac.usgs.gov/documents/179/SRTM_User_Guide_V3.pdf)

mod error;

pub use crate::error::NasademError;
use byteorder::{BigEndian as BE, ByteOrder, ReadBytesExt};
use geo::geometry::Coord;
use memmap2::Mmap;
use std::{fs::File, io::BufReader, mem::size_of, path::Path};

/// Floating point type used for tile coordinates.
pub type C = f64;

/// Value SRTM uses to mark a missing sample.
pub const VOID: i16 = i16::MIN;

const ARCSEC_PER_DEG: C = 3600.0;

pub struct Tile {
    /// Center of the south-west most sample of the tile.
    sw_corner_center: Coord<C>,

    /// Arcseconds per sample.
    resolution: u8,

    /// Number of samples along each edge of the (square) tile.
    side: usize,

    /// Elevation samples, north row first.
    samples: SampleStore,
}

enum SampleStore {
    InMem(Box<[i16]>),
    MemMap(Mmap),
}

impl SampleStore {
    fn get(&self, index: usize) -> i16 {
        match self {
            Self::InMem(samples) => samples[index],
            Self::MemMap(raw) => {
                let start = index * size_of::<i16>();
                BE::read_i16(&raw[start..start + size_of::<i16>()])
            }
        }
    }
}

impl Tile {
    /// Returns a Tile read into memory from the file at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, NasademError> {
        let path = path.as_ref();
        let (sw_corner_center, resolution, side) = header(path)?;
        let mut file = BufReader::new(File::open(path)?);
        let mut samples = vec![0_i16; side * side];
        file.read_i16_into::<BE>(&mut samples)?;
        Ok(Self {
            sw_corner_center,
            resolution,
            side,
            samples: SampleStore::InMem(samples.into_boxed_slice()),
        })
    }

    /// Returns a Tile using the memory-mapped file as storage.
    pub fn memmap<P: AsRef<Path>>(path: P) -> Result<Self, NasademError> {
        let path = path.as_ref();
        let (sw_corner_center, resolution, side) = header(path)?;
        let file = File::open(path)?;
        // Tile files are never written while mapped.
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Self {
            sw_corner_center,
            resolution,
            side,
            samples: SampleStore::MemMap(mmap),
        })
    }

    /// Returns the number of samples in this tile.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.side * self.side
    }

    /// Returns the number of samples along each edge.
    pub fn side(&self) -> usize {
        self.side
    }

    /// Returns this tile's resolution in arcseconds per sample.
    pub fn resolution(&self) -> u8 {
        self.resolution
    }

    /// Returns the center of the south-west most sample.
    pub fn sw_corner(&self) -> Coord<C> {
        self.sw_corner_center
    }

    /// Returns the sample nearest to `coord`, or `None` if `coord` is
    /// not covered by this tile.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn get(&self, coord: Coord<C>) -> Option<i16> {
        let samples_per_deg = ARCSEC_PER_DEG / C::from(self.resolution);
        let x = ((coord.x - self.sw_corner_center.x) * samples_per_deg).round();
        let y = ((coord.y - self.sw_corner_center.y) * samples_per_deg).round();
        #[allow(clippy::cast_precision_loss)]
        let last = (self.side - 1) as C;
        if (0.0..=last).contains(&x) && (0.0..=last).contains(&y) {
            self.get_xy(x as usize, y as usize)
        } else {
            None
        }
    }

    /// Returns the sample at column `x` (from the west edge) and row
    /// `y` (from the south edge).
    pub fn get_xy(&self, x: usize, y: usize) -> Option<i16> {
        if x < self.side && y < self.side {
            Some(self.samples.get(self.side * (self.side - 1 - y) + x))
        } else {
            None
        }
    }
}

/// Returns the integer south-west corner of the tile containing
/// `coord`.
#[allow(clippy::cast_possible_truncation)]
pub fn sw_corner(Coord { x, y }: Coord<C>) -> Coord<i16> {
    Coord {
        x: x.floor() as i16,
        y: y.floor() as i16,
    }
}

/// Returns the conventional file name of the tile whose south-west
/// corner is `sw_corner`, e.g. `N44W072.hgt`.
pub fn file_name(Coord { x, y }: Coord<i16>) -> String {
    let n_s = if y.is_negative() { 'S' } else { 'N' };
    let e_w = if x.is_negative() { 'W' } else { 'E' };
    format!("{n_s}{:02}{e_w}{:03}.hgt", y.unsigned_abs(), x.unsigned_abs())
}

fn header(path: &Path) -> Result<(Coord<C>, u8, usize), NasademError> {
    let (resolution, side) = extract_resolution(path)?;
    let Coord { x, y } = parse_sw_corner(path)?;
    let sw_corner_center = Coord {
        x: C::from(x),
        y: C::from(y),
    };
    Ok((sw_corner_center, resolution, side))
}

fn extract_resolution(path: &Path) -> Result<(u8, usize), NasademError> {
    const ONE_ARCSECOND_LEN: u64 = 3601 * 3601 * size_of::<i16>() as u64;
    const THREE_ARCSECOND_LEN: u64 = 1201 * 1201 * size_of::<i16>() as u64;
    match path.metadata()?.len() {
        ONE_ARCSECOND_LEN => Ok((1, 3601)),
        THREE_ARCSECOND_LEN => Ok((3, 1201)),
        invalid_len => Err(NasademError::HgtLen(invalid_len, path.to_owned())),
    }
}

fn parse_sw_corner(path: &Path) -> Result<Coord<i16>, NasademError> {
    let mk_err = || NasademError::HgtName(path.to_owned());
    let name = path
        .file_stem()
        .and_then(std::ffi::OsStr::to_str)
        .map(str::to_ascii_uppercase)
        .ok_or_else(mk_err)?;
    if name.len() != 7 || !name.is_ascii() {
        return Err(mk_err());
    }
    let lat_sign = match &name[0..1] {
        "N" => 1,
        "S" => -1,
        _ => return Err(mk_err()),
    };
    let lon_sign = match &name[3..4] {
        "E" => 1,
        "W" => -1,
        _ => return Err(mk_err()),
    };
    let lat = name[1..3].parse::<i16>().map_err(|_| mk_err())?;
    let lon = name[4..7].parse::<i16>().map_err(|_| mk_err())?;
    Ok(Coord {
        x: lon_sign * lon,
        y: lat_sign * lat,
    })
}
