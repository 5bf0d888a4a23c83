use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use super::{AddressCandidate, Coordinates, GeocodeError, GeocodingGateway};
use crate::config::GeocodingConfig;

/// Geoapify autocomplete client. The key travels as a query parameter, the
/// way the provider's REST surface expects it.
pub struct GeoapifyClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl GeoapifyClient {
    pub fn new(http: reqwest::Client, config: &GeocodingConfig) -> Result<Self, GeocodeError> {
        // Url::join drops the last path segment unless the base ends in '/'.
        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|err| GeocodeError::Decode(format!("invalid base url: {err}")))?;
        Ok(Self {
            http,
            base_url,
            api_key: config.api_key.clone(),
        })
    }

    fn autocomplete_url(&self, query: &str) -> Result<Url, GeocodeError> {
        let mut url = self
            .base_url
            .join("autocomplete")
            .map_err(|err| GeocodeError::Decode(format!("invalid endpoint: {err}")))?;
        url.query_pairs_mut()
            .append_pair("text", query)
            .append_pair("apiKey", &self.api_key);
        Ok(url)
    }
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    properties: FeatureProperties,
    geometry: FeatureGeometry,
}

#[derive(Debug, Deserialize)]
struct FeatureProperties {
    formatted: String,
}

#[derive(Debug, Deserialize)]
struct FeatureGeometry {
    // GeoJSON order: [longitude, latitude].
    coordinates: [f64; 2],
}

impl From<Feature> for AddressCandidate {
    fn from(feature: Feature) -> Self {
        let [longitude, latitude] = feature.geometry.coordinates;
        AddressCandidate {
            label: feature.properties.formatted,
            coordinates: Coordinates {
                latitude,
                longitude,
            },
        }
    }
}

#[async_trait]
impl GeocodingGateway for GeoapifyClient {
    async fn autocomplete(&self, query: &str) -> Result<Vec<AddressCandidate>, GeocodeError> {
        let url = self.autocomplete_url(query)?;
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| GeocodeError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Status(status.as_u16()));
        }

        let collection: FeatureCollection = response
            .json()
            .await
            .map_err(|err| GeocodeError::Decode(err.to_string()))?;

        Ok(collection
            .features
            .into_iter()
            .map(AddressCandidate::from)
            .collect())
    }
}
