use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

/// Public echo service answering `{"ip": "..."}`.
pub const IP_LOOKUP_URL: &str = "https://api.ipify.org?format=json";

#[derive(Debug, Deserialize)]
struct IpResponse {
    ip: String,
}

/// Best-effort lookup of this client's public address for origin metadata.
/// Any failure yields `None`; submission never waits on a retry.
pub async fn lookup_public_ip(client: &Client) -> Option<String> {
    lookup_public_ip_at(client, IP_LOOKUP_URL).await
}

pub async fn lookup_public_ip_at(client: &Client, url: &str) -> Option<String> {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => {
            debug!("Could not fetch IP address: {}", e);
            return None;
        }
    };

    match response.error_for_status() {
        Ok(response) => match response.json::<IpResponse>().await {
            Ok(body) if !body.ip.is_empty() => Some(body.ip),
            Ok(_) => None,
            Err(e) => {
                debug!("Undecodable IP lookup response: {}", e);
                None
            }
        },
        Err(e) => {
            debug!("IP lookup rejected: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_service_yields_none() {
        // Port 9 (discard) on loopback is closed on test machines.
        let client = Client::new();
        assert_eq!(lookup_public_ip_at(&client, "http://127.0.0.1:9/").await, None);
    }
}
