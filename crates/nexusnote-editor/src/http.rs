//! Backend client for `nexusnote-server`.

use async_trait::async_trait;
use nexusnote_core::{Block, NewBlock, Page, PageUpdate, Workspace};
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::StoreError;
use crate::store::{BlockStore, FileStore, PageStore, SessionStore, StoredFile};

/// Header the server reads the caller's identity from
pub const USER_HEADER: &str = "x-user-id";

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    user_id: Option<Uuid>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Deserialize)]
struct SessionBody {
    user_id: Option<Uuid>,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user_id: None,
        }
    }

    /// Act as the given user on every request
    pub fn signed_in(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach the caller's identity; `user_id` overrides the signed-in user
    fn request(&self, builder: RequestBuilder, user_id: Option<Uuid>) -> RequestBuilder {
        match user_id.or(self.user_id) {
            Some(user_id) => builder.header(USER_HEADER, user_id.to_string()),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, StoreError> {
        self.send_as(builder, None).await
    }

    async fn send_as(
        &self,
        builder: RequestBuilder,
        user_id: Option<Uuid>,
    ) -> Result<Response, StoreError> {
        let response = self.request(builder, user_id).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => status.to_string(),
        };
        Err(match status {
            StatusCode::NOT_FOUND => StoreError::NotFound(message),
            StatusCode::UNAUTHORIZED => StoreError::NotAuthenticated,
            _ => StoreError::Status {
                status: status.as_u16(),
                message,
            },
        })
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, StoreError> {
        self.send_json_as(builder, None).await
    }

    async fn send_json_as<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        user_id: Option<Uuid>,
    ) -> Result<T, StoreError> {
        Ok(self.send_as(builder, user_id).await?.json::<T>().await?)
    }
}

#[async_trait]
impl BlockStore for HttpBackend {
    async fn fetch_blocks(&self, page_id: Uuid) -> Result<Vec<Block>, StoreError> {
        let url = self.url(&format!("/api/pages/{}/blocks", page_id));
        self.send_json(self.client.get(url)).await
    }

    async fn insert_block(&self, page_id: Uuid, block: NewBlock) -> Result<Block, StoreError> {
        let url = self.url(&format!("/api/pages/{}/blocks", page_id));
        self.send_json(self.client.post(url).json(&block)).await
    }

    async fn update_block_content(
        &self,
        block_id: Uuid,
        content: Value,
    ) -> Result<Block, StoreError> {
        let url = self.url(&format!("/api/blocks/{}/content", block_id));
        self.send_json(self.client.put(url).json(&json!({ "content": content })))
            .await
    }

    async fn update_block_position(
        &self,
        page_id: Uuid,
        block_id: Uuid,
        position: i32,
    ) -> Result<(), StoreError> {
        let url = self.url(&format!("/api/blocks/{}/position", block_id));
        let body = json!({ "page_id": page_id, "position": position });
        self.send(self.client.put(url).json(&body)).await?;
        Ok(())
    }

    async fn delete_block(&self, block_id: Uuid) -> Result<(), StoreError> {
        let url = self.url(&format!("/api/blocks/{}", block_id));
        self.send(self.client.delete(url)).await?;
        Ok(())
    }
}

#[async_trait]
impl PageStore for HttpBackend {
    async fn get_page(&self, page_id: Uuid) -> Result<Page, StoreError> {
        let url = self.url(&format!("/api/pages/{}", page_id));
        self.send_json(self.client.get(url)).await
    }

    async fn update_page(&self, page_id: Uuid, update: PageUpdate) -> Result<Page, StoreError> {
        let url = self.url(&format!("/api/pages/{}", page_id));
        self.send_json(self.client.put(url).json(&update)).await
    }

    async fn list_workspaces(&self, user_id: Uuid) -> Result<Vec<Workspace>, StoreError> {
        let builder = self.client.get(self.url("/api/workspaces"));
        self.send_json_as(builder, Some(user_id)).await
    }
}

#[async_trait]
impl FileStore for HttpBackend {
    async fn upload_file(
        &self,
        user_id: Uuid,
        file_name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<StoredFile, StoreError> {
        let builder = self
            .client
            .post(self.url("/api/storage"))
            .query(&[("name", file_name)])
            .header(header::CONTENT_TYPE, mime_type)
            .body(bytes);
        self.send_json_as(builder, Some(user_id)).await
    }

    async fn delete_file(&self, path: &str) -> Result<(), StoreError> {
        let url = self.url(&format!("/api/storage/{}", path));
        self.send(self.client.delete(url)).await?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for HttpBackend {
    async fn current_user_id(&self) -> Result<Uuid, StoreError> {
        let session: SessionBody = self.send_json(self.client.get(self.url("/api/session"))).await?;
        session.user_id.ok_or(StoreError::NotAuthenticated)
    }
}
