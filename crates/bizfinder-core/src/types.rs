use serde::{Deserialize, Serialize};

/// Mean Earth radius (IUGG) used for all distance math in the workspace.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// A WGS84 point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// `true` when both components are finite and inside the WGS84 ranges.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Great-circle (haversine) distance in meters.
    #[must_use]
    pub fn distance_m(&self, other: &Coordinates) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let d_lat = lat2 - lat1;
        let d_lng = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().min(1.0).asin()
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// One business as returned by the places capability.
///
/// `place_id` is the identity: two records sharing it describe the same
/// physical business. Every other field is optional because the upstream
/// omits whatever it does not know.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessRecord {
    pub place_id: String,
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub rating: Option<f64>,
    pub review_count: Option<u32>,
    pub is_open_now: Option<bool>,
    pub location: Option<Coordinates>,
    #[serde(default)]
    pub raw: serde_json::Value,
}

impl BusinessRecord {
    /// A record carrying only its identity.
    #[must_use]
    pub fn new(place_id: impl Into<String>) -> Self {
        Self {
            place_id: place_id.into(),
            name: None,
            address: None,
            phone: None,
            website: None,
            rating: None,
            review_count: None,
            is_open_now: None,
            location: None,
            raw: serde_json::Value::Null,
        }
    }

    /// Copies every field of `other` that is populated there and empty here.
    ///
    /// Populated fields on `self` are never overwritten, even when `other`
    /// disagrees. Returns the number of fields filled.
    pub fn fill_missing_from(&mut self, other: &BusinessRecord) -> usize {
        let mut filled = 0;
        filled += fill_text(&mut self.name, other.name.as_ref());
        filled += fill_text(&mut self.address, other.address.as_ref());
        filled += fill_text(&mut self.phone, other.phone.as_ref());
        filled += fill_text(&mut self.website, other.website.as_ref());
        filled += fill_option(&mut self.rating, other.rating);
        filled += fill_option(&mut self.review_count, other.review_count);
        filled += fill_option(&mut self.is_open_now, other.is_open_now);
        filled += fill_option(&mut self.location, other.location);
        if raw_is_empty(&self.raw) && !raw_is_empty(&other.raw) {
            self.raw = other.raw.clone();
            filled += 1;
        }
        filled
    }
}

fn text_is_empty(value: Option<&String>) -> bool {
    value.is_none_or(|s| s.trim().is_empty())
}

fn fill_text(slot: &mut Option<String>, incoming: Option<&String>) -> usize {
    if text_is_empty(slot.as_ref()) && !text_is_empty(incoming) {
        *slot = incoming.cloned();
        1
    } else {
        0
    }
}

fn fill_option<T: Copy>(slot: &mut Option<T>, incoming: Option<T>) -> usize {
    if slot.is_none() && incoming.is_some() {
        *slot = incoming;
        1
    } else {
        0
    }
}

fn raw_is_empty(raw: &serde_json::Value) -> bool {
    match raw {
        serde_json::Value::Null => true,
        serde_json::Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_between_identical_points_is_zero() {
        let p = Coordinates::new(37.7749, -122.4194);
        assert!(p.distance_m(&p).abs() < 1e-6);
    }

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let a = Coordinates::new(10.0, 20.0);
        let b = Coordinates::new(11.0, 20.0);
        let d = a.distance_m(&b);
        assert!((d - 111_195.0).abs() < 50.0, "got {d}");
    }

    #[test]
    fn coordinates_validity_checks_ranges() {
        assert!(Coordinates::new(51.5074, -0.1278).is_valid());
        assert!(!Coordinates::new(91.0, 0.0).is_valid());
        assert!(!Coordinates::new(0.0, -180.5).is_valid());
        assert!(!Coordinates::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn fill_missing_takes_only_empty_fields() {
        let mut stored = BusinessRecord::new("abc");
        stored.name = Some("Blue Bottle".to_string());
        stored.phone = Some(String::new());

        let mut incoming = BusinessRecord::new("abc");
        incoming.name = Some("Blue Bottle Coffee".to_string());
        incoming.phone = Some("(415) 555-0100".to_string());
        incoming.website = Some("https://bluebottle.example".to_string());
        incoming.rating = Some(4.4);

        let filled = stored.fill_missing_from(&incoming);

        assert_eq!(filled, 3);
        assert_eq!(stored.name.as_deref(), Some("Blue Bottle"));
        assert_eq!(stored.phone.as_deref(), Some("(415) 555-0100"));
        assert_eq!(
            stored.website.as_deref(),
            Some("https://bluebottle.example")
        );
        assert_eq!(stored.rating, Some(4.4));
    }

    #[test]
    fn fill_missing_with_self_changes_nothing() {
        let mut record = BusinessRecord::new("abc");
        record.address = Some("1 Market St".to_string());
        let copy = record.clone();
        assert_eq!(record.fill_missing_from(&copy), 0);
        assert_eq!(record, copy);
    }

    #[test]
    fn raw_payload_replaces_empty_object() {
        let mut stored = BusinessRecord::new("abc");
        stored.raw = serde_json::json!({});
        let mut incoming = BusinessRecord::new("abc");
        incoming.raw = serde_json::json!({"vicinity": "Mission St"});
        assert_eq!(stored.fill_missing_from(&incoming), 1);
        assert_eq!(stored.raw["vicinity"], "Mission St");
    }
}
