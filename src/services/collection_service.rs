//! Collection Service

use crate::client_response_error::ClientResponseError;
use crate::services::crud_service::CrudService;
use crate::tools::dtos::{
    ApiResponse, DeleteSummary, Document, InsertedObject, ObjectCount, ObjectList, Query,
    UpdateSummary,
};
use crate::tools::options::{
    DeleteObjectsOptions, GetObjectsOptions, SendOptions, UpdateObjectsOptions,
};
use crate::Client;
use async_trait::async_trait;
use std::sync::Arc;

/// Service for the document endpoints of a single collection.
///
/// The collection name is not validated; the server is expected to create
/// unknown collections on first insert.
#[derive(Debug, Clone)]
pub struct CollectionService {
    client: Arc<Client>,
    name: String,
}

impl CollectionService {
    /// Creates a new CollectionService for the specified collection.
    pub fn new(client: Arc<Client>, name: &str) -> Self {
        Self {
            client,
            name: name.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rejects an empty object id without a round-trip. An incomplete
    /// configuration is reported first.
    fn check_object_id(&self, object_id: &str) -> Result<(), ClientResponseError> {
        if object_id.is_empty() {
            let url = self.client.build_url(&[self.name.as_str(), ""])?;
            return Err(ClientResponseError::not_found(
                url.as_str(),
                "Missing required object id.",
            ));
        }
        Ok(())
    }

    /// Inserts a new document and returns the id the server assigned to it.
    pub async fn insert_object(
        &self,
        document: Document,
    ) -> Result<ApiResponse<String>, ClientResponseError> {
        let options = SendOptions::post().with_body(document.into());
        let res = self.client.send(&[self.name.as_str()], options).await?;

        let inserted: InsertedObject = res.json()?;
        let object_id = inserted.object_id.into_string();
        if object_id.is_empty() {
            return Err(ClientResponseError::decode(
                &res.url,
                res.status,
                "the server returned an empty object id",
            ));
        }

        Ok(ApiResponse::new(res.status, object_id))
    }

    /// Returns a single document by its object id.
    pub async fn get_object(
        &self,
        object_id: &str,
    ) -> Result<ApiResponse<Document>, ClientResponseError> {
        self.check_object_id(object_id)?;

        let res = self
            .client
            .send(&[self.name.as_str(), object_id], SendOptions::get())
            .await?;
        Ok(ApiResponse::new(res.status, res.json()?))
    }

    /// Returns the number of documents matching `query`.
    pub async fn get_object_count(
        &self,
        query: Query,
    ) -> Result<ApiResponse<u64>, ClientResponseError> {
        let options = SendOptions::get()
            .with_query("query", query)
            .with_query_overflow("query");
        let res = self.client.send(&[self.name.as_str(), "count"], options).await?;

        let count: ObjectCount = res.json()?;
        Ok(ApiResponse::new(res.status, count.value()))
    }

    /// Replaces or patches a document by its object id. Only the status is
    /// returned.
    pub async fn update_object(
        &self,
        object_id: &str,
        document: Document,
    ) -> Result<ApiResponse<()>, ClientResponseError> {
        self.check_object_id(object_id)?;

        let options = SendOptions::put().with_body(document.into());
        let res = self.client.send(&[self.name.as_str(), object_id], options).await?;
        Ok(ApiResponse::new(res.status, ()))
    }

    /// Applies `document` to the documents matching `query`.
    pub async fn update_objects(
        &self,
        query: Query,
        document: Document,
        options: UpdateObjectsOptions,
    ) -> Result<ApiResponse<UpdateSummary>, ClientResponseError> {
        let options = options.into_send_options(query, document);
        let res = self.client.send(&[self.name.as_str()], options).await?;
        Ok(ApiResponse::new(res.status, res.json_or_default()?))
    }

    /// Deletes a document by its object id.
    pub async fn delete_object(
        &self,
        object_id: &str,
    ) -> Result<ApiResponse<()>, ClientResponseError> {
        self.check_object_id(object_id)?;

        let res = self
            .client
            .send(&[self.name.as_str(), object_id], SendOptions::delete())
            .await?;
        Ok(ApiResponse::new(res.status, ()))
    }

    /// Deletes the documents matching `query`.
    pub async fn delete_objects(
        &self,
        query: Query,
        options: DeleteObjectsOptions,
    ) -> Result<ApiResponse<DeleteSummary>, ClientResponseError> {
        let options = options.into_send_options(query);
        let res = self.client.send(&[self.name.as_str()], options).await?;
        Ok(ApiResponse::new(res.status, res.json_or_default()?))
    }
}

#[async_trait]
impl CrudService for CollectionService {
    fn collection_name(&self) -> &str {
        &self.name
    }

    fn client(&self) -> &Arc<Client> {
        &self.client
    }

    async fn get_objects(
        &self,
        query: Query,
        options: GetObjectsOptions,
    ) -> Result<ApiResponse<Vec<Document>>, ClientResponseError> {
        let options = options.into_send_options(query);
        let res = self.client.send(&[self.name.as_str()], options).await?;

        let list: ObjectList = res.json()?;
        Ok(ApiResponse::new(res.status, list.into_documents()))
    }
}
