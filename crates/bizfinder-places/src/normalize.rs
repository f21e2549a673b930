//! Conversion of raw upstream payloads into [`BusinessRecord`]s.

use bizfinder_core::{BusinessRecord, Coordinates};

use crate::types::{PlaceDetails, PlaceResult};

/// Build a record from one nearby-search result.
///
/// Returns `None` when the payload has no usable `place_id`; without it the
/// record cannot be deduplicated.
#[must_use]
pub fn normalize_place(raw: serde_json::Value) -> Option<BusinessRecord> {
    let place: PlaceResult = match serde_json::from_value(raw.clone()) {
        Ok(place) => place,
        Err(e) => {
            tracing::warn!(error = %e, "skipping place result with unexpected shape");
            return None;
        }
    };

    let Some(place_id) = place.place_id.filter(|id| !id.trim().is_empty()) else {
        tracing::warn!(name = ?place.name, "skipping place result without place_id");
        return None;
    };

    Some(BusinessRecord {
        place_id,
        name: place.name,
        address: place.formatted_address.or(place.vicinity),
        phone: None,
        website: None,
        rating: place.rating,
        review_count: place.user_ratings_total,
        is_open_now: place.opening_hours.and_then(|h| h.open_now),
        location: place
            .geometry
            .map(|g| Coordinates::new(g.location.lat, g.location.lng)),
        raw,
    })
}

/// Overlay a Place Details payload onto a record.
///
/// Details are the more authoritative source, so any value they carry
/// replaces the nearby-search value.
pub fn apply_details(record: &mut BusinessRecord, details: PlaceDetails) {
    if details.name.is_some() {
        record.name = details.name;
    }
    if details.formatted_address.is_some() {
        record.address = details.formatted_address;
    }
    if details.formatted_phone_number.is_some() {
        record.phone = details.formatted_phone_number;
    }
    if details.website.is_some() {
        record.website = details.website;
    }
    if details.rating.is_some() {
        record.rating = details.rating;
    }
    if details.user_ratings_total.is_some() {
        record.review_count = details.user_ratings_total;
    }
    if let Some(open_now) = details.opening_hours.and_then(|h| h.open_now) {
        record.is_open_now = Some(open_now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalizes_full_nearby_result() {
        let raw = json!({
            "place_id": "place123",
            "name": "Test Business 1",
            "vicinity": "123 Test Street",
            "geometry": {"location": {"lat": 37.77, "lng": -122.42}},
            "rating": 4.5,
            "user_ratings_total": 100,
            "opening_hours": {"open_now": true}
        });

        let record = normalize_place(raw.clone()).expect("record");
        assert_eq!(record.place_id, "place123");
        assert_eq!(record.name.as_deref(), Some("Test Business 1"));
        assert_eq!(record.address.as_deref(), Some("123 Test Street"));
        assert_eq!(record.rating, Some(4.5));
        assert_eq!(record.review_count, Some(100));
        assert_eq!(record.is_open_now, Some(true));
        assert_eq!(record.location, Some(Coordinates::new(37.77, -122.42)));
        assert_eq!(record.raw, raw);
    }

    #[test]
    fn drops_result_without_place_id() {
        assert!(normalize_place(json!({"name": "Nameless"})).is_none());
        assert!(normalize_place(json!({"place_id": "  ", "name": "Blank"})).is_none());
    }

    #[test]
    fn drops_result_with_wrong_shape() {
        assert!(normalize_place(json!({"place_id": 42})).is_none());
    }

    #[test]
    fn details_override_nearby_values() {
        let mut record = normalize_place(json!({
            "place_id": "place123",
            "name": "Short Name",
            "vicinity": "123 Test Street",
            "rating": 4.0
        }))
        .unwrap();

        apply_details(
            &mut record,
            PlaceDetails {
                name: Some("Test Business 1".to_owned()),
                formatted_address: Some("123 Test Street, Test City, TC 12345".to_owned()),
                formatted_phone_number: Some("(123) 456-7890".to_owned()),
                website: Some("https://testbusiness1.com".to_owned()),
                rating: None,
                user_ratings_total: Some(100),
                opening_hours: None,
            },
        );

        assert_eq!(record.name.as_deref(), Some("Test Business 1"));
        assert_eq!(
            record.address.as_deref(),
            Some("123 Test Street, Test City, TC 12345")
        );
        assert_eq!(record.phone.as_deref(), Some("(123) 456-7890"));
        assert_eq!(record.website.as_deref(), Some("https://testbusiness1.com"));
        assert_eq!(record.rating, Some(4.0), "absent detail keeps nearby value");
        assert_eq!(record.review_count, Some(100));
    }
}
