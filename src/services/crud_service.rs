//! CRUD Service trait

use crate::client_response_error::ClientResponseError;
use crate::tools::dtos::{ApiResponse, Document, Query, Sort};
use crate::tools::options::GetObjectsOptions;
use crate::Client;
use async_trait::async_trait;
use std::sync::Arc;

/// Default page size used by [`CrudService::get_all_objects`].
pub const DEFAULT_BATCH_SIZE: u64 = 500;

/// Trait for services that read documents out of a collection.
#[async_trait]
pub trait CrudService: Send + Sync {
    /// Returns the collection this service addresses.
    fn collection_name(&self) -> &str;

    /// Returns a reference to the client.
    fn client(&self) -> &Arc<Client>;

    /// Returns the documents matching `query`.
    async fn get_objects(
        &self,
        query: Query,
        options: GetObjectsOptions,
    ) -> Result<ApiResponse<Vec<Document>>, ClientResponseError>;

    /// Returns the first document matching `query`, or a 404 error when
    /// nothing matches.
    async fn get_first_object(
        &self,
        query: Query,
        sort: Option<Sort>,
    ) -> Result<ApiResponse<Document>, ClientResponseError> {
        let mut options = GetObjectsOptions::new().limit(1);
        options.sort = sort;

        let result = self.get_objects(query, options).await?;
        let status = result.status;

        match result.data.into_iter().next() {
            Some(doc) => Ok(ApiResponse::new(status, doc)),
            None => Err(ClientResponseError::not_found(
                self.client()
                    .build_url(&[self.collection_name()])?
                    .as_str(),
                "No object matches the query.",
            )),
        }
    }

    /// Returns every document matching `query`, fetched in pages of `batch`.
    async fn get_all_objects(
        &self,
        query: Query,
        sort: Option<Sort>,
        batch: Option<u64>,
    ) -> Result<Vec<Document>, ClientResponseError> {
        let batch = batch.unwrap_or(DEFAULT_BATCH_SIZE).max(1);
        let mut result: Vec<Document> = Vec::new();
        let mut skip = 0u64;

        loop {
            let mut options = GetObjectsOptions::new().limit(batch).skip(skip);
            options.sort = sort.clone();

            let page = self.get_objects(query.clone(), options).await?;
            let items_count = page.data.len() as u64;

            result.extend(page.data);

            if items_count < batch {
                break;
            }

            skip += batch;
        }

        Ok(result)
    }
}
