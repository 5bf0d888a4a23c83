use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use super::{HazardKind, HazardLookupError, HazardRegistry};
use crate::config::HazardConfig;
use crate::geocoding::Coordinates;

/// PPR status code for a withdrawn/inactive plan. Any other status counts
/// as an active plan.
const PPR_STATUS_INACTIVE: &str = "03";

const PAGE: u32 = 1;
const PAGE_SIZE: u32 = 10;

/// Client for the Géorisques GASPAR registries.
///
/// Each lookup fetches the first page of records around a coordinate pair
/// and applies a registry-specific presence predicate to it.
pub struct GeorisquesClient {
    http: reqwest::Client,
    base_url: Url,
}

impl GeorisquesClient {
    pub fn new(http: reqwest::Client, config: &HazardConfig) -> Result<Self, HazardLookupError> {
        // Url::join drops the last path segment unless the base ends in '/'.
        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).map_err(|err| HazardLookupError::Decode {
            kind: HazardKind::Tri,
            detail: format!("invalid base url: {err}"),
        })?;
        Ok(Self { http, base_url })
    }

    fn endpoint_path(kind: HazardKind) -> &'static str {
        match kind {
            HazardKind::Tri => "gaspar/tri",
            HazardKind::Ppri => "ppr",
            HazardKind::Papi => "gaspar/papi",
        }
    }

    fn lookup_url(
        &self,
        kind: HazardKind,
        coords: Coordinates,
        radius_meters: u32,
    ) -> Result<Url, HazardLookupError> {
        let mut url = self
            .base_url
            .join(Self::endpoint_path(kind))
            .map_err(|err| HazardLookupError::Decode {
                kind,
                detail: format!("invalid endpoint: {err}"),
            })?;
        url.query_pairs_mut()
            .append_pair("rayon", &radius_meters.to_string())
            .append_pair(
                "latlon",
                &format!("{},{}", coords.latitude, coords.longitude),
            )
            .append_pair("page", &PAGE.to_string())
            .append_pair("page_size", &PAGE_SIZE.to_string());
        Ok(url)
    }

    async fn fetch<T>(&self, kind: HazardKind, url: Url) -> Result<T, HazardLookupError>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| HazardLookupError::Transport {
                kind,
                detail: err.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(HazardLookupError::Status {
                kind,
                status: status.as_u16(),
            });
        }

        response.json().await.map_err(|err| HazardLookupError::Decode {
            kind,
            detail: err.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct TriPage {
    #[serde(default)]
    data: Vec<TriRecord>,
}

#[derive(Debug, Deserialize)]
struct TriRecord {
    code_national_tri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PprPage {
    #[serde(default)]
    data: Vec<PprRecord>,
}

#[derive(Debug, Deserialize)]
struct PprRecord {
    etat: PprStatus,
}

#[derive(Debug, Deserialize)]
struct PprStatus {
    code_etat: String,
}

#[derive(Debug, Deserialize)]
struct PapiPage {
    #[serde(default)]
    data: Vec<PapiRecord>,
}

#[derive(Debug, Deserialize)]
struct PapiRecord {
    code_national_papi: Option<String>,
}

fn tri_present(page: &TriPage) -> bool {
    page.data
        .iter()
        .any(|record| record.code_national_tri.is_some())
}

fn ppr_active(page: &PprPage) -> bool {
    page.data
        .iter()
        .any(|record| record.etat.code_etat != PPR_STATUS_INACTIVE)
}

fn papi_present(page: &PapiPage) -> bool {
    page.data
        .iter()
        .any(|record| record.code_national_papi.is_some())
}

#[async_trait]
impl HazardRegistry for GeorisquesClient {
    async fn zone_present(
        &self,
        kind: HazardKind,
        coords: Coordinates,
        radius_meters: u32,
    ) -> Result<bool, HazardLookupError> {
        let url = self.lookup_url(kind, coords, radius_meters)?;
        match kind {
            HazardKind::Tri => {
                let page: TriPage = self.fetch(kind, url).await?;
                Ok(tri_present(&page))
            }
            HazardKind::Ppri => {
                let page: PprPage = self.fetch(kind, url).await?;
                Ok(ppr_active(&page))
            }
            HazardKind::Papi => {
                let page: PapiPage = self.fetch(kind, url).await?;
                Ok(papi_present(&page))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GeorisquesClient {
        let config = HazardConfig {
            base_url: "https://georisques.gouv.fr/api/v1".to_string(),
            radius_meters: 100,
        };
        GeorisquesClient::new(reqwest::Client::new(), &config).expect("client builds")
    }

    fn paris() -> Coordinates {
        Coordinates {
            latitude: 48.8692,
            longitude: 2.3310,
        }
    }

    #[test]
    fn lookup_urls_target_the_gaspar_endpoints() {
        let client = client();
        let tri = client
            .lookup_url(HazardKind::Tri, paris(), 100)
            .expect("tri url builds");
        assert_eq!(tri.path(), "/api/v1/gaspar/tri");

        let ppr = client
            .lookup_url(HazardKind::Ppri, paris(), 100)
            .expect("ppr url builds");
        assert_eq!(ppr.path(), "/api/v1/ppr");

        let papi = client
            .lookup_url(HazardKind::Papi, paris(), 100)
            .expect("papi url builds");
        assert_eq!(papi.path(), "/api/v1/gaspar/papi");
    }

    #[test]
    fn lookup_urls_carry_radius_latlon_and_paging() {
        let url = client()
            .lookup_url(HazardKind::Tri, paris(), 250)
            .expect("url builds");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(pairs.contains(&("rayon".to_string(), "250".to_string())));
        assert!(pairs.contains(&("latlon".to_string(), "48.8692,2.331".to_string())));
        assert!(pairs.contains(&("page".to_string(), "1".to_string())));
        assert!(pairs.contains(&("page_size".to_string(), "10".to_string())));
    }

    #[test]
    fn tri_presence_requires_a_non_null_national_code() {
        let page: TriPage = serde_json::from_value(serde_json::json!({
            "data": [
                { "code_national_tri": null },
                { "code_national_tri": "FRD_TRI_PARIS" }
            ]
        }))
        .expect("tri page decodes");
        assert!(tri_present(&page));

        let absent: TriPage = serde_json::from_value(serde_json::json!({
            "data": [{ "code_national_tri": null }]
        }))
        .expect("tri page decodes");
        assert!(!tri_present(&absent));
    }

    #[test]
    fn ppr_activity_excludes_the_inactive_status() {
        let active: PprPage = serde_json::from_value(serde_json::json!({
            "data": [
                { "etat": { "code_etat": "03" } },
                { "etat": { "code_etat": "01" } }
            ]
        }))
        .expect("ppr page decodes");
        assert!(ppr_active(&active));

        let inactive: PprPage = serde_json::from_value(serde_json::json!({
            "data": [{ "etat": { "code_etat": "03" } }]
        }))
        .expect("ppr page decodes");
        assert!(!ppr_active(&inactive));
    }

    #[test]
    fn papi_presence_requires_a_non_null_national_code() {
        let page: PapiPage = serde_json::from_value(serde_json::json!({
            "data": [{ "code_national_papi": "PAPI-SEINE" }]
        }))
        .expect("papi page decodes");
        assert!(papi_present(&page));
    }

    #[test]
    fn empty_or_missing_data_means_absent() {
        let empty: TriPage =
            serde_json::from_value(serde_json::json!({ "data": [] })).expect("decodes");
        assert!(!tri_present(&empty));

        let missing: PapiPage =
            serde_json::from_value(serde_json::json!({})).expect("decodes");
        assert!(!papi_present(&missing));
    }
}
