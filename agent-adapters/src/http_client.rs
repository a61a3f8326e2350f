use std::sync::Arc;
use std::time::Duration;

use hyper::body::to_bytes;
use hyper::client::HttpConnector;
use hyper::header::{AUTHORIZATION, CONTENT_TYPE};
use hyper::{Body, Client, Request, StatusCode, Uri};
use hyper_rustls::HttpsConnector;
use rustls::{ClientConfig, OwnedTrustAnchor, RootCertStore};
use tokio::time::timeout;
use webpki_roots::TLS_SERVER_ROOTS;

use crate::traits::{AdapterError, AdapterResult};

pub(crate) type HyperClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Builds a client that speaks both plain HTTP (local services) and HTTPS.
#[allow(clippy::unnecessary_wraps)]
pub(crate) fn build_https_client() -> AdapterResult<HyperClient> {
    let mut roots = RootCertStore::empty();
    roots.add_trust_anchors(TLS_SERVER_ROOTS.iter().map(|anchor| {
        OwnedTrustAnchor::from_subject_spki_name_constraints(
            anchor.subject,
            anchor.spki,
            anchor.name_constraints,
        )
    }));

    let config = ClientConfig::builder()
        .with_safe_defaults()
        .with_root_certificates(roots)
        .with_no_client_auth();

    let mut http = HttpConnector::new();
    http.enforce_http(false);

    let connector = HttpsConnector::from((http, Arc::new(config)));

    Ok(Client::builder().build::<_, Body>(connector))
}

/// Raw outcome of a JSON POST: status plus the full response body.
pub(crate) struct RawResponse {
    pub(crate) status: StatusCode,
    pub(crate) body: Vec<u8>,
}

/// Sends `body` as a JSON POST and buffers the response.
///
/// `label` names the remote party in error messages. A `None` deadline waits
/// for as long as the connection stays open.
pub(crate) async fn post_json(
    client: &HyperClient,
    endpoint: &Uri,
    body: Vec<u8>,
    bearer: Option<&str>,
    deadline: Option<Duration>,
    label: &str,
) -> AdapterResult<RawResponse> {
    let mut builder = Request::post(endpoint.clone()).header(CONTENT_TYPE, "application/json");
    if let Some(token) = bearer {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }

    let request = builder
        .body(Body::from(body))
        .map_err(|err| AdapterError::transport(format!("failed to build {label} request: {err}")))?;

    let exchange = async {
        let response = client
            .request(request)
            .await
            .map_err(|err| AdapterError::transport(format!("{label} request failed: {err}")))?;
        let status = response.status();
        let bytes = to_bytes(response.into_body()).await.map_err(|err| {
            AdapterError::transport(format!("failed to read {label} response: {err}"))
        })?;
        Ok::<_, AdapterError>((status, bytes))
    };

    // The deadline covers the body as well as the headers.
    let (status, bytes) = match deadline {
        Some(limit) => timeout(limit, exchange)
            .await
            .map_err(|_| AdapterError::transport(format!("{label} request timed out")))??,
        None => exchange.await?,
    };

    Ok(RawResponse {
        status,
        body: bytes.to_vec(),
    })
}
