//! Coordinate Reference System handling
//!
//! GeoTIFF files carry their CRS as GeoKeys. Only the EPSG code of a
//! projected or geographic CRS is kept; user-defined CRS definitions are
//! recorded as their citation text when present.

use serde::{Deserialize, Serialize};
use std::fmt;

/// GeoKey id for a projected CRS EPSG code
pub const PROJECTED_CS_TYPE_GEOKEY: u16 = 3072;
/// GeoKey id for a geographic CRS EPSG code
pub const GEOGRAPHIC_TYPE_GEOKEY: u16 = 2048;

/// Coordinate Reference System representation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CRS {
    /// EPSG code if known
    epsg: Option<u32>,
    /// Free-form description (GeoTIFF citation, WKT fragment)
    citation: Option<String>,
    /// Whether the CRS is geographic (lat/lon) rather than projected
    geographic: bool,
}

impl CRS {
    /// Projected CRS from an EPSG code
    pub fn from_epsg(code: u32) -> Self {
        Self {
            epsg: Some(code),
            citation: None,
            geographic: false,
        }
    }

    /// Geographic CRS from an EPSG code
    pub fn geographic_epsg(code: u32) -> Self {
        Self {
            epsg: Some(code),
            citation: None,
            geographic: true,
        }
    }

    /// CRS known only by a textual description
    pub fn from_citation(citation: impl Into<String>) -> Self {
        Self {
            epsg: None,
            citation: Some(citation.into()),
            geographic: false,
        }
    }

    /// WGS84 geographic CRS (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::geographic_epsg(4326)
    }

    /// Build a CRS from a GeoKey id/value pair, if the key names a CRS
    pub fn from_geokey(key_id: u16, value: u16) -> Option<Self> {
        // 0 is "undefined", 32767 is "user-defined"
        if value == 0 || value == 32767 {
            return None;
        }
        match key_id {
            PROJECTED_CS_TYPE_GEOKEY => Some(Self::from_epsg(value as u32)),
            GEOGRAPHIC_TYPE_GEOKEY => Some(Self::geographic_epsg(value as u32)),
            _ => None,
        }
    }

    /// GeoKey id/value pair that encodes this CRS, if it has an EPSG code
    /// that fits a GeoKey short value
    pub fn to_geokey(&self) -> Option<(u16, u16)> {
        let code = u16::try_from(self.epsg?).ok()?;
        let key = if self.geographic {
            GEOGRAPHIC_TYPE_GEOKEY
        } else {
            PROJECTED_CS_TYPE_GEOKEY
        };
        Some((key, code))
    }

    /// Get EPSG code if known
    pub fn epsg(&self) -> Option<u32> {
        self.epsg
    }

    /// Get the textual description, if any
    pub fn citation(&self) -> Option<&str> {
        self.citation.as_deref()
    }

    /// Whether coordinates are geographic degrees
    pub fn is_geographic(&self) -> bool {
        self.geographic
    }

    /// Check if two CRS are equivalent
    pub fn is_equivalent(&self, other: &CRS) -> bool {
        match (self.epsg, other.epsg) {
            (Some(a), Some(b)) => a == b,
            _ => self.citation.is_some() && self.citation == other.citation,
        }
    }

    /// Get a string identifier for this CRS
    pub fn identifier(&self) -> String {
        if let Some(code) = self.epsg {
            return format!("EPSG:{}", code);
        }
        if let Some(citation) = &self.citation {
            let end = citation
                .char_indices()
                .nth(50)
                .map_or(citation.len(), |(i, _)| i);
            return citation[..end].to_string();
        }
        "Unknown".to_string()
    }
}

impl fmt::Display for CRS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}
