use log::{debug, error};
use reqwest::{Client, StatusCode, header};

use super::{FetchStatus, Fetched, FileRequest, GraphPageRequest, Transport};
use crate::error::FetchError;
use crate::sha::Sha;
use crate::tree::TreeEntry;

const ACCEPT_HTML: &str = "text/html";
const ACCEPT_JSON: &str = "application/json";

/// Transport talking to the graph server over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Result<Self, FetchError> {
        let client = Client::builder()
            .build()
            .map_err(|e| FetchError::network(base_url, e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get(
        &self,
        path: &str,
        query: &[(&'static str, String)],
        accept: &str,
    ) -> Result<(FetchStatus, reqwest::Response), FetchError> {
        let url = format!("{}{}", self.base_url, path);
        let request = self
            .client
            .get(&url)
            .query(query)
            .header(header::ACCEPT, accept)
            .header("X-Requested-With", "XMLHttpRequest")
            .build()
            .map_err(|e| FetchError::network(&url, e.to_string()))?;

        let target = request.url().to_string();
        let request_id = uuid::Uuid::new_v4();
        debug!("[{request_id}] GET {target}");

        let response = self.client.execute(request).await.map_err(|e| {
            error!("[{request_id}] GET {target} failed: {e}");
            FetchError::network(&target, e.to_string())
        })?;

        let status = response.status();
        debug!("[{request_id}] {status} from {target}");
        match status {
            StatusCode::NOT_MODIFIED => Ok((FetchStatus::NotModified, response)),
            StatusCode::NOT_FOUND => Err(FetchError::NotFound { target }),
            s if s.is_success() => Ok((FetchStatus::Success, response)),
            s => Err(FetchError::network(
                target,
                s.canonical_reason().unwrap_or(s.as_str()).to_string(),
            )),
        }
    }

    async fn get_text(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<Fetched<String>, FetchError> {
        let (status, response) = self.get(path, query, ACCEPT_HTML).await?;
        let target = response.url().to_string();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::network(target, e.to_string()))?;
        Ok(Fetched { status, body })
    }
}

impl Transport for HttpTransport {
    async fn fetch_commit_detail(
        &self,
        sha: &Sha,
        compare_to: Option<&Sha>,
    ) -> Result<Fetched<String>, FetchError> {
        let query: Vec<_> = compare_to
            .map(|old| ("compare_to", old.to_string()))
            .into_iter()
            .collect();
        self.get_text(&format!("/sha/{sha}"), &query).await
    }

    async fn fetch_graph_page(
        &self,
        request: &GraphPageRequest,
    ) -> Result<Fetched<String>, FetchError> {
        self.get_text(&request.head.path(), &request.query()).await
    }

    async fn fetch_tree_children(
        &self,
        content_id: &Sha,
        full_name: Option<&str>,
    ) -> Result<Fetched<Vec<TreeEntry>>, FetchError> {
        let query: Vec<_> = full_name
            .map(|name| ("parent_name", name.to_string()))
            .into_iter()
            .collect();
        let (status, response) = self
            .get(&format!("/sha/{content_id}"), &query, ACCEPT_JSON)
            .await?;
        let target = response.url().to_string();
        if status == FetchStatus::NotModified {
            return Ok(Fetched::not_modified(Vec::new()));
        }
        let body = response
            .json::<Vec<TreeEntry>>()
            .await
            .map_err(|e| FetchError::Decode {
                target,
                message: e.to_string(),
            })?;
        Ok(Fetched { status, body })
    }

    async fn fetch_file_content(&self, request: &FileRequest) -> Result<Fetched<String>, FetchError> {
        self.get_text(&format!("/sha/{}", request.content_id), &request.query())
            .await
    }
}
