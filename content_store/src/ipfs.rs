// content_store/src/ipfs.rs

use async_trait::async_trait;
use log::{debug, error};
use models::{EhrError, EhrResult};
use serde::Deserialize;

use crate::store::ContentStore;

/// IPFS node client over the HTTP API (`/api/v0/add`, `/api/v0/cat`).
/// The node does the content addressing; re-adding identical bytes returns
/// the same CID without error.
#[derive(Debug, Clone)]
pub struct IpfsClient {
    endpoint: String,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct AddResponse {
    #[serde(rename = "Hash")]
    hash: String,
}

impl IpfsClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        IpfsClient {
            endpoint: endpoint.into(),
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ContentStore for IpfsClient {
    async fn put(&self, bytes: Vec<u8>) -> EhrResult<String> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name("payload");
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(format!("{}/api/v0/add", self.endpoint))
            .multipart(form)
            .send()
            .await
            .map_err(|err| EhrError::ContentStore(format!("ipfs add: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            error!("ipfs add rejected with status {status}");
            return Err(EhrError::ContentStore(format!("ipfs add: status {status}")));
        }

        let added: AddResponse = response
            .json()
            .await
            .map_err(|err| EhrError::ContentStore(format!("ipfs add response: {err}")))?;
        debug!("uploaded payload to ipfs as {}", added.hash);
        Ok(added.hash)
    }

    async fn get(&self, cid: &str) -> EhrResult<Vec<u8>> {
        let response = self
            .http
            .post(format!("{}/api/v0/cat", self.endpoint))
            .query(&[("arg", cid)])
            .send()
            .await
            .map_err(|err| EhrError::ContentStore(format!("ipfs cat: {err}")))?;

        if !response.status().is_success() {
            return Err(EhrError::ContentNotFound(cid.to_string()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|err| EhrError::ContentStore(format!("ipfs cat body: {err}")))?;
        Ok(bytes.to_vec())
    }
}
