//! BaaSKit Rust SDK
//!
//! An asynchronous client for the BaaSKit document store: insert, query,
//! update and delete JSON documents kept in named collections, authenticated
//! with an application id and client key.

pub mod client;
pub mod client_response_error;
pub mod config;
pub mod services;
pub mod tools;

#[cfg(test)]
pub(crate) mod testutil;

pub use client::{Client, RawResponse};
pub use client_response_error::{ClientResponseError, ErrorKind};
pub use config::{Config, CredentialPlacement};
pub use services::{CollectionService, CrudService};
pub use tools::completion::spawn_with_completion;
pub use tools::dtos::{ApiResponse, DeleteSummary, Document, ObjectId, Query, Sort, UpdateSummary};
pub use tools::options::{
    DeleteObjectsOptions, GetObjectsOptions, SendOptions, UpdateObjectsOptions,
};
