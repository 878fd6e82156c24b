use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Response;
use serde_json::Value;
use tracing::{debug, warn};
use urlencoding::encode;

use crate::error::{DeskError, Result};
use crate::json_repair::{excerpt, parse_lenient};
use crate::models::ft::{ConfirmationRequest, ReservationsResponse};

/// Client for the FT Asset Management settlement API.
#[derive(Clone)]
pub struct FtRepository {
    client: reqwest::Client,
    ft_url: String,
    api_key: String,
}

impl FtRepository {
    pub fn new(ft_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            ft_url: ft_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub async fn get_reservations(&self, account: &str) -> Result<ReservationsResponse> {
        let url = format!(
            "{}/reservation.asp?key={}&account={}",
            self.ft_url,
            encode(&self.api_key),
            encode(account)
        );
        debug!("Querying reservations for account {}", account);
        let req = self.client.get(url).send().await;
        let body = self.read_body("reservation", req).await?;
        ReservationsResponse::from_value(parse_lenient(&body)?)
    }

    pub async fn confirm_reservation(&self, request: &ConfirmationRequest) -> Result<Value> {
        let url = format!("{}/reservation_confirmation.asp", self.ft_url);
        let serde_body = serde_json::to_string(&request.envelope())?;
        debug!("Confirming reservation {}", request.res_code);
        let req = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(serde_body)
            .send()
            .await;
        let body = self.read_body("reservation_confirmation", req).await?;
        // The confirmation endpoint sometimes answers with plain text.
        match parse_lenient(&body) {
            Ok(value) => Ok(value),
            Err(_) => Ok(Value::String(body.trim().to_string())),
        }
    }

    pub async fn get_receiving(&self) -> Result<Value> {
        let url = format!("{}/receiving.asp?key={}", self.ft_url, encode(&self.api_key));
        let req = self.client.get(url).send().await;
        let body = self.read_body("receiving", req).await?;
        parse_lenient(&body)
    }

    async fn read_body(
        &self,
        endpoint: &str,
        req: reqwest::Result<Response>,
    ) -> Result<String> {
        let res = match req {
            Ok(res) => res,
            Err(e) => {
                warn!("{} call failed: {}", endpoint, e);
                return Err(DeskError::Http(e));
            }
        };
        let status = res.status();
        let body = res.text().await.map_err(|e| {
            warn!("{} body could not be read: {}", endpoint, e);
            DeskError::Http(e)
        })?;
        if !status.is_success() {
            warn!("{} answered {}: {}", endpoint, status, excerpt(&body));
            return Err(DeskError::Status {
                status,
                body: excerpt(&body),
            });
        }
        Ok(body)
    }
}
