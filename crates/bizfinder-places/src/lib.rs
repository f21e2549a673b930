//! Client for the Google Places and Geocoding web services, and the
//! [`PlaceLookup`] capability the search core drives.

pub mod client;
pub mod error;
pub mod lookup;
pub mod normalize;
pub mod types;

pub use client::{GeocodedLocation, PlacesClient};
pub use error::PlacesError;
pub use lookup::{LookupPage, LookupQuery, PlaceLookup};
