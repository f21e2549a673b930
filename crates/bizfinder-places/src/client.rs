//! HTTP client for the Google Places Nearby Search, Place Details, and
//! Geocoding endpoints.
//!
//! Every endpoint answers HTTP 200 with a JSON envelope whose `status`
//! field carries the real outcome; [`PlacesClient::check_status`] turns the
//! non-`OK` statuses into [`PlacesError::Api`].

use std::time::Duration;

use async_trait::async_trait;
use bizfinder_core::{BusinessRecord, Coordinates};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

use crate::error::PlacesError;
use crate::lookup::{LookupPage, LookupQuery, PlaceLookup};
use crate::normalize::{apply_details, normalize_place};
use crate::types::{GeocodeResponse, NearbySearchResponse, PlaceDetails, PlaceDetailsResponse};

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/";
const NEARBY_SEARCH_PATH: &str = "maps/api/place/nearbysearch/json";
const PLACE_DETAILS_PATH: &str = "maps/api/place/details/json";
const GEOCODE_PATH: &str = "maps/api/geocode/json";

const DETAIL_FIELDS: &str =
    "name,rating,website,formatted_address,formatted_phone_number,opening_hours,user_ratings_total";

/// The upstream rejects larger radii for a single nearby search.
pub const MAX_CALL_RADIUS_M: f64 = 50_000.0;

#[derive(Debug, Clone)]
pub struct GeocodedLocation {
    pub coordinates: Coordinates,
    pub formatted_address: String,
}

/// Client for the Google Maps web services.
///
/// Use [`PlacesClient::new`] for production or
/// [`PlacesClient::with_base_url`] to point at a mock server in tests.
pub struct PlacesClient {
    client: Client,
    api_key: String,
    base_url: Url,
    fetch_details: bool,
    details_delay: Duration,
}

impl PlacesClient {
    /// Creates a client pointed at the production Google endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`PlacesError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, PlacesError> {
        Self::with_base_url(api_key, timeout_secs, user_agent, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`PlacesError::Http`] if the `reqwest::Client` cannot be
    /// built, or [`PlacesError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        user_agent: &str,
        base_url: &str,
    ) -> Result<Self, PlacesError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // Exactly one trailing slash, so joining a relative endpoint path
        // appends to the base instead of replacing its last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| PlacesError::InvalidBaseUrl {
            base_url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url,
            fetch_details: false,
            details_delay: Duration::ZERO,
        })
    }

    /// Enables per-result Place Details enrichment in [`PlaceLookup::lookup`],
    /// pausing `delay_ms` between consecutive detail calls.
    #[must_use]
    pub fn with_details(mut self, enabled: bool, delay_ms: u64) -> Self {
        self.fetch_details = enabled;
        self.details_delay = Duration::from_millis(delay_ms);
        self
    }

    /// Fetches one page of nearby-search results, without detail enrichment.
    ///
    /// # Errors
    ///
    /// - [`PlacesError::Api`] for a non-`OK`/`ZERO_RESULTS` status.
    /// - [`PlacesError::PageTokenNotReady`] when a continuation token is
    ///   rejected as `INVALID_REQUEST`.
    /// - [`PlacesError::Http`] / [`PlacesError::UnexpectedStatus`] on
    ///   transport failures.
    pub async fn nearby_search(&self, query: LookupQuery<'_>) -> Result<LookupPage, PlacesError> {
        let location = format!("{},{}", query.center.latitude, query.center.longitude);
        let radius = format!("{:.0}", query.radius_m.clamp(1.0, MAX_CALL_RADIUS_M));
        let mut params = vec![
            ("location", location.as_str()),
            ("radius", radius.as_str()),
            ("keyword", query.term),
        ];
        if let Some(token) = query.page_token {
            params.push(("pagetoken", token));
        }

        let url = self.build_url(NEARBY_SEARCH_PATH, &params)?;
        let response: NearbySearchResponse = self.request_json(url, "nearby search").await?;

        if query.page_token.is_some() && response.status == "INVALID_REQUEST" {
            return Err(PlacesError::PageTokenNotReady);
        }
        Self::check_status(&response.status, response.error_message.as_deref())?;

        let results = response
            .results
            .into_iter()
            .filter_map(normalize_place)
            .collect();

        Ok(LookupPage {
            results,
            next_page_token: response.next_page_token.filter(|t| !t.is_empty()),
        })
    }

    /// Fetches the detail fields for one place.
    ///
    /// # Errors
    ///
    /// Returns [`PlacesError::Api`] if the status is not `OK`, plus the
    /// transport errors of [`Self::nearby_search`].
    pub async fn place_details(&self, place_id: &str) -> Result<PlaceDetails, PlacesError> {
        let url = self.build_url(
            PLACE_DETAILS_PATH,
            &[("place_id", place_id), ("fields", DETAIL_FIELDS)],
        )?;
        let response: PlaceDetailsResponse = self.request_json(url, "place details").await?;
        Self::check_status(&response.status, response.error_message.as_deref())?;
        Ok(response.result.unwrap_or_default())
    }

    /// Resolves a free-form address or place name to coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`PlacesError::NotFound`] when nothing matches, otherwise the
    /// same errors as [`Self::nearby_search`].
    pub async fn geocode(&self, address: &str) -> Result<GeocodedLocation, PlacesError> {
        let url = self.build_url(GEOCODE_PATH, &[("address", address)])?;
        let response: GeocodeResponse = self.request_json(url, "geocode").await?;
        Self::check_status(&response.status, response.error_message.as_deref())?;

        let first = response
            .results
            .into_iter()
            .next()
            .ok_or_else(|| PlacesError::NotFound {
                query: address.to_owned(),
            })?;

        Ok(GeocodedLocation {
            coordinates: Coordinates::new(
                first.geometry.location.lat,
                first.geometry.location.lng,
            ),
            formatted_address: first.formatted_address,
        })
    }

    /// Replaces each record's fields with its Place Details, one call at a
    /// time. A failed detail call keeps the nearby-search record.
    async fn enrich(&self, records: Vec<BusinessRecord>) -> Vec<BusinessRecord> {
        let mut enriched = Vec::with_capacity(records.len());
        for (i, mut record) in records.into_iter().enumerate() {
            if i > 0 && !self.details_delay.is_zero() {
                tokio::time::sleep(self.details_delay).await;
            }
            match self.place_details(&record.place_id).await {
                Ok(details) => apply_details(&mut record, details),
                Err(e) => {
                    tracing::warn!(
                        place_id = %record.place_id,
                        error = %e,
                        "place details unavailable; keeping basic record"
                    );
                }
            }
            enriched.push(record);
        }
        enriched
    }

    fn build_url(&self, path: &str, extra: &[(&str, &str)]) -> Result<Url, PlacesError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| PlacesError::InvalidBaseUrl {
                base_url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in extra {
                pairs.append_pair(k, v);
            }
            pairs.append_pair("key", &self.api_key);
        }
        Ok(url)
    }

    /// Sends a GET, asserts a 2xx status, and parses the body as `T`.
    ///
    /// `context` names the endpoint in errors; the URL itself is never
    /// included because it carries the API key.
    async fn request_json<T: DeserializeOwned>(
        &self,
        url: Url,
        context: &str,
    ) -> Result<T, PlacesError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PlacesError::UnexpectedStatus {
                status: status.as_u16(),
                endpoint: context.to_owned(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| PlacesError::Deserialize {
            context: context.to_owned(),
            source: e,
        })
    }

    fn check_status(status: &str, message: Option<&str>) -> Result<(), PlacesError> {
        match status {
            "OK" | "ZERO_RESULTS" => Ok(()),
            other => Err(PlacesError::Api {
                status: other.to_owned(),
                message: message.unwrap_or("no error message").to_owned(),
            }),
        }
    }
}

#[async_trait]
impl PlaceLookup for PlacesClient {
    async fn lookup(&self, query: LookupQuery<'_>) -> Result<LookupPage, PlacesError> {
        let mut page = self.nearby_search(query).await?;
        if self.fetch_details && !page.results.is_empty() {
            page.results = self.enrich(page.results).await;
        }
        Ok(page)
    }
}
