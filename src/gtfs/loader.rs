//! Loads the static GTFS tables from a directory or a zip archive.

use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use super::{Agency, GtfsDataset, GtfsTables};
use crate::error::GtfsLoadError;

const AGENCY_FILE: &str = "agency.txt";
const ROUTES_FILE: &str = "routes.txt";
const TRIPS_FILE: &str = "trips.txt";
const STOPS_FILE: &str = "stops.txt";
const STOP_TIMES_FILE: &str = "stop_times.txt";
const SHAPES_FILE: &str = "shapes.txt";
const FREQUENCIES_FILE: &str = "frequencies.txt";

/// Loads a GTFS dataset from `path`, which may be a directory of `.txt`
/// files or a `.zip` archive.
#[tracing::instrument(skip(path), fields(path = %path.as_ref().display()))]
pub fn load(path: impl AsRef<Path>) -> Result<GtfsDataset, GtfsLoadError> {
    let path = path.as_ref();
    if path.is_dir() {
        load_dir(path)
    } else {
        load_zip(path)
    }
}

pub fn load_dir(dir: &Path) -> Result<GtfsDataset, GtfsLoadError> {
    let tables = read_tables(|file_name| {
        let path = dir.join(file_name);
        if path.exists() {
            Ok(Some(Box::new(File::open(path)?) as Box<dyn Read>))
        } else {
            Ok(None)
        }
    })?;
    Ok(GtfsDataset::from(tables))
}

pub fn load_zip(path: &Path) -> Result<GtfsDataset, GtfsLoadError> {
    let mut archive = zip::ZipArchive::new(File::open(path)?)?;
    let tables = read_tables(|file_name| match archive.by_name(file_name) {
        Ok(mut entry) => {
            let mut buf = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut buf)?;
            Ok(Some(Box::new(std::io::Cursor::new(buf)) as Box<dyn Read>))
        }
        Err(zip::result::ZipError::FileNotFound) => Ok(None),
        Err(e) => Err(e.into()),
    })?;
    Ok(GtfsDataset::from(tables))
}

fn read_tables<F>(mut open: F) -> Result<GtfsTables, GtfsLoadError>
where
    F: FnMut(&'static str) -> Result<Option<Box<dyn Read>>, GtfsLoadError>,
{
    let mut required = |file: &'static str| -> Result<Box<dyn Read>, GtfsLoadError> {
        open(file)?.ok_or(GtfsLoadError::MissingFile(file))
    };

    let agencies: Vec<Agency> = read_table(AGENCY_FILE, required(AGENCY_FILE)?)?;
    for agency in &agencies {
        if agency.agency_timezone.parse::<chrono_tz::Tz>().is_err() {
            return Err(GtfsLoadError::InvalidTimezone(agency.agency_timezone.clone()));
        }
    }
    let routes = read_table(ROUTES_FILE, required(ROUTES_FILE)?)?;
    let trips = read_table(TRIPS_FILE, required(TRIPS_FILE)?)?;
    let stops = read_table(STOPS_FILE, required(STOPS_FILE)?)?;
    let stop_times = read_table(STOP_TIMES_FILE, required(STOP_TIMES_FILE)?)?;

    let shapes = match open(SHAPES_FILE)? {
        Some(reader) => read_table(SHAPES_FILE, reader)?,
        None => Vec::new(),
    };
    let frequencies = match open(FREQUENCIES_FILE)? {
        Some(reader) => read_table(FREQUENCIES_FILE, reader)?,
        None => Vec::new(),
    };

    let tables = GtfsTables {
        agencies,
        routes,
        trips,
        stops,
        stop_times,
        shapes,
        frequencies,
    };

    info!(
        agencies = tables.agencies.len(),
        routes = tables.routes.len(),
        trips = tables.trips.len(),
        stops = tables.stops.len(),
        stop_times = tables.stop_times.len(),
        shape_points = tables.shapes.len(),
        frequencies = tables.frequencies.len(),
        "GTFS tables loaded"
    );

    Ok(tables)
}

fn read_table<T: DeserializeOwned>(
    file: &'static str,
    reader: impl Read,
) -> Result<Vec<T>, GtfsLoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let record: T = result.map_err(|source| GtfsLoadError::Csv { file, source })?;
        rows.push(record);
    }

    debug!(file, rows = rows.len(), "Read GTFS table");
    Ok(rows)
}
