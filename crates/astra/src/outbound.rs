use http::{Request, Response};
use once_cell::sync::Lazy;
use reqwest::Client;

use crate::error::AstraError;

/// A single, global client, built once
pub static CLIENT: Lazy<Client> = Lazy::new(Client::new);

/// Execute a prepared request and hand back the raw response.
///
/// Non-success statuses are returned as responses rather than errors so the
/// provider's parser can read the error body.
pub async fn call_outbound(req: Request<Vec<u8>>) -> Result<Response<Vec<u8>>, AstraError> {
    let client = &*CLIENT;

    let method = req
        .method()
        .as_str()
        .parse::<reqwest::Method>()
        .map_err(|e| AstraError::InvalidRequest(e.to_string()))?;

    let mut rb = client.request(method, req.uri().to_string());

    for (name, value) in req.headers().iter() {
        let val_str = value
            .to_str()
            .map_err(|e| AstraError::InvalidRequest(e.to_string()))?;
        rb = rb.header(name.as_str(), val_str);
    }

    let resp = rb.body(req.into_body()).send().await?;

    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = resp.bytes().await?.to_vec();
    log::trace!("outbound response: {} ({} bytes)", status, bytes.len());

    let mut builder = Response::builder().status(status.as_u16());
    for (name, value) in headers.iter() {
        builder = builder.header(name.as_str(), value.as_bytes());
    }
    Ok(builder.body(bytes)?)
}
