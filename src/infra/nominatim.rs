// ============================================================
// Layer 6 — Nominatim Geocoder
// ============================================================
// ForwardGeocoder backed by an OpenStreetMap Nominatim search
// endpoint:
//
//   GET {endpoint}?q=<address>&format=jsonv2&limit=1
//
// Nominatim answers with a JSON array of places; latitude and
// longitude arrive as decimal strings. An empty array means
// "not found".
//
// Each request carries its own timeout. reqwest reports an
// elapsed timeout through `Error::is_timeout`, which maps to
// LookupError::Timeout so the geocoding stage can count it.
//
// The public instance requires an identifying User-Agent.
//
// Reference: https://nominatim.org/release-docs/latest/api/Search/

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::domain::location::Coordinates;
use crate::domain::traits::{ForwardGeocoder, LookupError};

pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";
pub const DEFAULT_USER_AGENT: &str = "text2map_geocoder";

/// One entry of a Nominatim search response (fields we use only)
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

pub struct NominatimGeocoder {
    client:   Client,
    endpoint: String,
}

impl NominatimGeocoder {
    pub fn new(endpoint: &str, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .context("Cannot build HTTP client for the geocoder")?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

impl ForwardGeocoder for NominatimGeocoder {
    fn forward(&self, address: &str, timeout: Duration) -> Result<Option<Coordinates>, LookupError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("q", address), ("format", "jsonv2"), ("limit", "1")])
            .timeout(timeout)
            .send()
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Transport(format!("HTTP {status}")));
        }

        let places: Vec<NominatimPlace> = response.json().map_err(classify)?;

        places.into_iter().next().map(parse_place).transpose()
    }
}

fn classify(e: reqwest::Error) -> LookupError {
    if e.is_timeout() {
        LookupError::Timeout
    } else if e.is_decode() {
        LookupError::InvalidResponse(e.to_string())
    } else {
        LookupError::Transport(e.to_string())
    }
}

fn parse_place(place: NominatimPlace) -> Result<Coordinates, LookupError> {
    let latitude: f64 = place
        .lat
        .parse()
        .map_err(|_| LookupError::InvalidResponse(format!("bad latitude '{}'", place.lat)))?;
    let longitude: f64 = place
        .lon
        .parse()
        .map_err(|_| LookupError::InvalidResponse(format!("bad longitude '{}'", place.lon)))?;

    Ok(Coordinates::new(latitude, longitude))
}
