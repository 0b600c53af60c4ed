//! Address to coordinates.

use crate::document::Document;
use crate::errors::ApiError;
use bson::{Bson, doc};
use std::collections::HashMap;

/// A resolved address in GeoJSON point form.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    /// `[lng, lat]`; `None` when the address could not be placed.
    pub coordinates: Option<[f64; 2]>,
    pub formatted_address: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zipcode: String,
    pub country: String,
}

impl Location {
    #[must_use]
    pub fn to_document(&self) -> Document {
        let mut d = doc! {"type": "Point"};
        if let Some([lng, lat]) = self.coordinates {
            d.insert("coordinates", vec![Bson::Double(lng), Bson::Double(lat)]);
        }
        d.insert("formattedAddress", self.formatted_address.clone());
        d.insert("street", self.street.clone());
        d.insert("city", self.city.clone());
        d.insert("state", self.state.clone());
        d.insert("zipcode", self.zipcode.clone());
        d.insert("country", self.country.clone());
        d
    }
}

pub trait Geocoder: Send + Sync {
    /// # Errors
    /// Provider-specific failure, surfaced as a store-side error.
    fn geocode(&self, address: &str) -> Result<Location, ApiError>;
}

/// Resolves coordinates from a fixed zipcode table. Addresses are read as
/// `"street, city, ST zipcode"`; a bare zipcode is accepted too.
#[derive(Debug, Clone, Default)]
pub struct OfflineGeocoder {
    zipcodes: HashMap<String, [f64; 2]>,
}

impl OfflineGeocoder {
    #[must_use]
    pub fn new(zipcodes: HashMap<String, [f64; 2]>) -> Self {
        Self { zipcodes }
    }
}

fn is_zipcode(s: &str) -> bool {
    s.len() == 5 && s.bytes().all(|b| b.is_ascii_digit())
}

impl Geocoder for OfflineGeocoder {
    fn geocode(&self, address: &str) -> Result<Location, ApiError> {
        let parts: Vec<&str> = address.split(',').map(str::trim).filter(|p| !p.is_empty()).collect();
        let (mut street, mut city, mut state, mut zipcode) =
            (String::new(), String::new(), String::new(), String::new());
        if let Some((last, rest)) = parts.split_last() {
            let tokens: Vec<&str> = last.split_whitespace().collect();
            match tokens.as_slice() {
                [zip] if is_zipcode(zip) => zipcode = (*zip).to_string(),
                [st, zip] if is_zipcode(zip) => {
                    state = st.to_ascii_uppercase();
                    zipcode = (*zip).to_string();
                }
                _ => state = (*last).to_string(),
            }
            if let Some((c, s)) = rest.split_last() {
                city = (*c).to_string();
                street = s.join(", ");
            }
        }
        let coordinates = self.zipcodes.get(&zipcode).copied();
        if coordinates.is_none() {
            log::warn!("no coordinates for address \"{address}\"");
        }
        let formatted_address = [street.as_str(), city.as_str(), format!("{state} {zipcode}").trim()]
            .iter()
            .filter(|p| !p.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(", ");
        Ok(Location {
            coordinates,
            formatted_address,
            street,
            city,
            state,
            zipcode,
            country: "US".into(),
        })
    }
}
