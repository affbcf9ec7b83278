//! TAPD API client implementation.
//!
//! This module provides the domain-level operations used to build a status
//! report: work item counts and the paginated iteration list.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, instrument};

use super::auth::{AuthMode, Credentials};
use super::error::{ApiError, Result};
use super::gateway::{Endpoint, ParamValue, Params, ReadOnlyGateway};
use super::transport::{HttpTransport, Transport};
use super::types::{extract_count, Iteration, Resource, ITERATION_FIELDS};
use crate::config::Profile;

/// Default number of iterations requested per page.
pub const DEFAULT_PAGE_SIZE: u32 = 200;

/// Default cap on the number of pages fetched for one listing.
pub const DEFAULT_MAX_PAGES: u32 = 1000;

/// The TAPD API client.
///
/// Owns its transport and token state; calls are made one at a time.
#[derive(Debug)]
pub struct TapdClient<T: Transport = HttpTransport> {
    gateway: ReadOnlyGateway<T>,
    workspace_id: String,
    max_pages: u32,
}

impl TapdClient<HttpTransport> {
    /// Create a client from a validated profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    #[instrument(skip(profile), fields(workspace_id = %profile.workspace_id))]
    pub fn new(profile: &Profile) -> Result<Self> {
        let transport = HttpTransport::new(Duration::from_secs(profile.timeout_secs))?;
        let client = Self::with_transport(
            transport,
            &profile.base_url,
            &profile.workspace_id,
            profile.credentials.clone(),
        )
        .with_max_pages(profile.max_pages);

        info!(auth_mode = %client.auth_mode(), "TAPD client created");
        Ok(client)
    }
}

impl<T: Transport> TapdClient<T> {
    /// Create a client over an explicit transport.
    pub fn with_transport(
        transport: T,
        base_url: &str,
        workspace_id: &str,
        credentials: Credentials,
    ) -> Self {
        Self {
            gateway: ReadOnlyGateway::new(transport, base_url, credentials),
            workspace_id: workspace_id.to_string(),
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    /// Set the pagination cap.
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    /// The workspace this client queries.
    pub fn workspace_id(&self) -> &str {
        &self.workspace_id
    }

    /// The active authentication mode.
    pub fn auth_mode(&self) -> AuthMode {
        self.gateway.auth_mode()
    }

    /// The underlying transport.
    #[cfg(test)]
    pub fn transport(&self) -> &T {
        self.gateway.transport()
    }

    /// Get the total number of items of `resource` in the workspace.
    ///
    /// Calls `GET /{resource}/count`. A missing count is reported as 0.
    #[instrument(skip(self))]
    pub async fn get_count(&mut self, resource: Resource) -> Result<u64> {
        let params: Params = vec![("workspace_id", ParamValue::from(self.workspace_id.as_str()))];
        let payload = self
            .gateway
            .request_readonly(&resource.count_path(), &params, true)
            .await?;

        let count = extract_count(&payload)?;
        debug!(count, "Fetched count");
        Ok(count)
    }

    /// List iterations, following pagination until the last page.
    ///
    /// `status_filter` is omitted from the query when empty, which lists all
    /// statuses. A page with fewer than `page_size` rows is the last one.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::PageLimitExceeded` if the listing does not end
    /// within the configured page cap.
    #[instrument(skip(self))]
    pub async fn list_iterations(
        &mut self,
        status_filter: Option<&str>,
        page_size: u32,
    ) -> Result<Vec<Iteration>> {
        let page_size = page_size.max(1);
        let status_filter = status_filter.map(str::trim).filter(|s| !s.is_empty());
        let mut iterations = Vec::new();
        let mut page: u32 = 1;

        loop {
            if page > self.max_pages {
                return Err(ApiError::PageLimitExceeded {
                    path: Endpoint::Iterations.path().to_string(),
                    max_pages: self.max_pages,
                });
            }

            let mut params: Params = vec![
                ("workspace_id", ParamValue::from(self.workspace_id.as_str())),
                ("fields", ParamValue::from(ITERATION_FIELDS)),
                ("limit", ParamValue::from(page_size)),
                ("page", ParamValue::from(page)),
            ];
            if let Some(status) = status_filter {
                params.push(("status", ParamValue::from(status)));
            }

            let mut payload = self
                .gateway
                .request_readonly(Endpoint::Iterations.path(), &params, true)
                .await?;

            let rows = match payload.remove("data") {
                Some(Value::Array(rows)) => rows,
                _ => Vec::new(),
            };
            if rows.is_empty() {
                break;
            }

            let fetched = rows.len();
            for row in rows {
                iterations.push(Iteration::from_row(row)?);
            }
            debug!(page, fetched, total = iterations.len(), "Fetched iteration page");

            if fetched < page_size as usize {
                break;
            }
            page += 1;
        }

        Ok(iterations)
    }
}
