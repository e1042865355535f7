//! Zip-code to time-zone resolution
//!
//! Serves local-time lookups for schedule evaluation from an in-memory
//! zip-code mapping. The mapping is filled once at startup from the
//! GeoNames US dataset (the download itself is an external ETL concern);
//! after load it is effectively read-only, but a read-write lock keeps
//! incremental updates safe since reads vastly outnumber writes.

use crate::error::{InjectorError, InjectorResult};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::collections::HashMap;
use std::io::BufRead;
use std::sync::RwLock;

/// Location and time-zone data for one zip code.
#[derive(Clone, Debug, PartialEq)]
pub struct ZipCodeInfo {
    pub zip_code: String,
    pub latitude: f64,
    pub longitude: f64,
    pub city: String,
    pub state: String,
    /// IANA zone identifier, e.g. `America/New_York`.
    pub time_zone: String,
}

/// In-memory map of zip code to location/zone info.
pub struct ZipCodeCache {
    cache: RwLock<HashMap<String, ZipCodeInfo>>,
}

impl Default for ZipCodeCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ZipCodeCache {
    pub fn new() -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Add or replace one zip code entry.
    pub fn insert(&self, info: ZipCodeInfo) {
        let mut cache = self.cache.write().expect("zip cache lock poisoned");
        cache.insert(info.zip_code.clone(), info);
    }

    /// Look up one zip code.
    pub fn get(&self, zip_code: &str) -> Option<ZipCodeInfo> {
        let cache = self.cache.read().expect("zip cache lock poisoned");
        cache.get(zip_code).cloned()
    }

    pub fn len(&self) -> usize {
        self.cache.read().expect("zip cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// IANA zone identifier for a zip code, if present.
    pub fn resolve_time_zone(&self, zip_code: &str) -> Option<String> {
        self.get(zip_code).map(|info| info.time_zone)
    }

    /// Convert a UTC instant to the local time at a zip code.
    ///
    /// Fails with `ZipCodeNotFound` when the zip is absent from the
    /// mapping and `UnknownTimeZone` when the stored zone name is not a
    /// resolvable IANA identifier.
    pub fn local_time(&self, zip_code: &str, utc: DateTime<Utc>) -> InjectorResult<DateTime<Tz>> {
        let info = self.get(zip_code).ok_or_else(|| InjectorError::ZipCodeNotFound {
            zip_code: zip_code.to_string(),
        })?;

        let zone: Tz = info
            .time_zone
            .parse()
            .map_err(|_| InjectorError::UnknownTimeZone {
                time_zone: info.time_zone.clone(),
            })?;

        Ok(utc.with_timezone(&zone))
    }

    /// Load entries from the GeoNames tab-separated US dataset.
    ///
    /// Columns: country code, postal code, place name, state, state code,
    /// county, ..., latitude (10th), longitude (11th), accuracy. Rows with
    /// fewer than 12 columns, the header row, and rows with unparseable
    /// coordinates are skipped. Returns the number of entries loaded.
    pub fn load_from_tsv<R: BufRead>(&self, reader: R) -> InjectorResult<usize> {
        let mut loaded = 0usize;

        for line in reader.lines() {
            let line = line?;
            let fields: Vec<&str> = line.split('\t').collect();

            if fields.len() < 12 || fields[0] == "country code" {
                continue;
            }

            let Ok(latitude) = fields[9].parse::<f64>() else {
                continue;
            };
            let Ok(longitude) = fields[10].parse::<f64>() else {
                continue;
            };

            self.insert(ZipCodeInfo {
                zip_code: fields[1].to_string(),
                latitude,
                longitude,
                city: fields[2].to_string(),
                state: fields[3].to_string(),
                time_zone: time_zone_for_longitude(longitude).to_string(),
            });
            loaded += 1;
        }

        Ok(loaded)
    }
}

/// Assign a US time zone from longitude using fixed bands.
///
/// A deliberate approximation, not a polygon lookup: continental US
/// longitudes run from about -125 (West Coast) to -67 (East Coast).
pub fn time_zone_for_longitude(longitude: f64) -> &'static str {
    if longitude >= -82.0 {
        "America/New_York" // Eastern
    } else if longitude >= -100.0 {
        "America/Chicago" // Central
    } else if longitude >= -115.0 {
        "America/Denver" // Mountain
    } else {
        "America/Los_Angeles" // Pacific
    }
}
