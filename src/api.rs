// src/api.rs
//! REST surface of the studio backend, behind the `Backend` trait so the
//! pollers, resource facade, and tests all share one seam. `HttpBackend`
//! is the production implementation: reqwest with a cookie store standing
//! in for the browser's `credentials: 'include'` session continuity.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::models::{
    AuthCheck, CreateInstaPostResponse, CreateProjectResponse, DashboardStats, GeneratedImages,
    ImageRequest, ImageSource, InstaPost, NewInstaPost, NewProject, Project, Upload,
};

/// One method per backend operation the dashboard consumes.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn check_auth(&self) -> Result<AuthCheck, ApiError>;
    async fn logout(&self) -> Result<(), ApiError>;

    async fn list_projects(&self) -> Result<Vec<Project>, ApiError>;
    async fn get_project(&self, id: i64) -> Result<Project, ApiError>;
    async fn create_project(&self, new: NewProject) -> Result<CreateProjectResponse, ApiError>;
    async fn delete_project(&self, id: i64) -> Result<(), ApiError>;

    async fn stats(&self) -> Result<DashboardStats, ApiError>;

    async fn list_insta_posts(&self) -> Result<Vec<InstaPost>, ApiError>;
    async fn get_insta_post(&self, id: i64) -> Result<InstaPost, ApiError>;
    async fn delete_insta_post(&self, id: i64) -> Result<(), ApiError>;
    async fn generate_insta_post(
        &self,
        new: NewInstaPost,
    ) -> Result<CreateInstaPostResponse, ApiError>;

    async fn generate_image(&self, request: ImageRequest) -> Result<GeneratedImages, ApiError>;
    async fn save_images(&self, post_id: i64, image_urls: &[String]) -> Result<(), ApiError>;
}

pub type SharedBackend = Arc<dyn Backend>;

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder().cookie_store(true).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Map a non-2xx response to `ApiError`, pulling the backend's
    /// structured `{error}` message out of the body when present.
    async fn check(&self, response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthenticated);
        }
        let message = match response.json::<serde_json::Value>().await {
            Ok(body) => body
                .get("error")
                .and_then(|e| e.as_str())
                .unwrap_or("request failed")
                .to_string(),
            Err(_) => "request failed".to_string(),
        };
        Err(ApiError::Status { status, message })
    }

    fn file_part(upload: Upload) -> Result<Part, ApiError> {
        Part::bytes(upload.bytes)
            .file_name(upload.filename)
            .mime_str(&upload.mime)
            .map_err(|e| ApiError::Payload(format!("invalid upload mime type: {}", e)))
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn check_auth(&self) -> Result<AuthCheck, ApiError> {
        let response = self.client.get(self.url("/check-auth")).send().await?;
        let auth = self.check(response).await?.json::<AuthCheck>().await?;
        debug!("Auth check: authenticated={}", auth.authenticated);
        Ok(auth)
    }

    async fn logout(&self) -> Result<(), ApiError> {
        let response = self.client.post(self.url("/logout")).send().await?;
        self.check(response).await?;
        info!("Logged out");
        Ok(())
    }

    async fn list_projects(&self) -> Result<Vec<Project>, ApiError> {
        let response = self.client.get(self.url("/projects")).send().await?;
        let projects = self.check(response).await?.json::<Vec<Project>>().await?;
        debug!("Fetched {} projects", projects.len());
        Ok(projects)
    }

    async fn get_project(&self, id: i64) -> Result<Project, ApiError> {
        let response = self
            .client
            .get(self.url(&format!("/projects/{}", id)))
            .send()
            .await?;
        Ok(self.check(response).await?.json::<Project>().await?)
    }

    async fn create_project(&self, new: NewProject) -> Result<CreateProjectResponse, ApiError> {
        let has_character = new.character_image.is_some();
        let mut form = Form::new()
            .text("title", new.title)
            .text("raw_description", new.raw_description)
            .text("company_service", new.company_service)
            .text("character_image", if has_character { "true" } else { "false" });
        if let Some(upload) = new.character_image {
            form = form.part("character_image_file", Self::file_part(upload)?);
        }

        info!("🎬 Submitting video generation project");
        let response = self
            .client
            .post(self.url("/projects"))
            .multipart(form)
            .send()
            .await?;
        let created = self
            .check(response)
            .await?
            .json::<CreateProjectResponse>()
            .await?;
        if !created.success {
            let message = created
                .error
                .unwrap_or_else(|| "Failed to start generation".to_string());
            return Err(ApiError::Payload(message));
        }
        Ok(created)
    }

    async fn delete_project(&self, id: i64) -> Result<(), ApiError> {
        let response = self
            .client
            .delete(self.url(&format!("/projects/{}", id)))
            .send()
            .await?;
        self.check(response).await?;
        info!("🗑️ Deleted project {}", id);
        Ok(())
    }

    async fn stats(&self) -> Result<DashboardStats, ApiError> {
        let response = self.client.get(self.url("/stats")).send().await?;
        Ok(self.check(response).await?.json::<DashboardStats>().await?)
    }

    async fn list_insta_posts(&self) -> Result<Vec<InstaPost>, ApiError> {
        let response = self.client.get(self.url("/insta-posts")).send().await?;
        let posts = self.check(response).await?.json::<Vec<InstaPost>>().await?;
        debug!("Fetched {} Instagram posts", posts.len());
        Ok(posts)
    }

    async fn get_insta_post(&self, id: i64) -> Result<InstaPost, ApiError> {
        let response = self
            .client
            .get(self.url(&format!("/insta-posts/{}", id)))
            .send()
            .await?;
        Ok(self.check(response).await?.json::<InstaPost>().await?)
    }

    async fn delete_insta_post(&self, id: i64) -> Result<(), ApiError> {
        let response = self
            .client
            .delete(self.url(&format!("/insta-posts/{}", id)))
            .send()
            .await?;
        self.check(response).await?;
        info!("🗑️ Deleted Instagram post {}", id);
        Ok(())
    }

    async fn generate_insta_post(
        &self,
        new: NewInstaPost,
    ) -> Result<CreateInstaPostResponse, ApiError> {
        let mut form = Form::new()
            .text("keyword", new.keyword)
            .text("mode", new.mode.as_str());
        if let Some(logo) = new.logo {
            form = form.part("logo", Self::file_part(logo)?);
        }
        if let Some(character) = new.character {
            form = form.part("character", Self::file_part(character)?);
        }
        if let Some(hiring) = new.hiring {
            form = form
                .text("position", hiring.position)
                .text("experience", hiring.experience)
                .text("location", hiring.location)
                .text("post", hiring.post);
        }

        info!("📸 Submitting Instagram post generation");
        let response = self
            .client
            .post(self.url("/generate-insta-post"))
            .multipart(form)
            .send()
            .await?;
        Ok(self
            .check(response)
            .await?
            .json::<CreateInstaPostResponse>()
            .await?)
    }

    async fn generate_image(&self, request: ImageRequest) -> Result<GeneratedImages, ApiError> {
        let mut form = Form::new()
            .text("final_prompt", request.final_prompt)
            .text("aspect_ratio", request.aspect_ratio)
            .text("resolution", request.resolution);
        match request.source {
            ImageSource::Uploads { logo, character } => {
                if let Some(logo) = logo {
                    form = form.part("logo", Self::file_part(logo)?);
                }
                if let Some(character) = character {
                    form = form.part("character", Self::file_part(character)?);
                }
            }
            ImageSource::StoredPost { post_id } => {
                form = form.text("post_id", post_id.to_string());
            }
        }

        info!("🎨 Requesting banner image generation");
        let response = self
            .client
            .post(self.url("/generate-image"))
            .multipart(form)
            .send()
            .await?;
        let images = self
            .check(response)
            .await?
            .json::<GeneratedImages>()
            .await?;
        if images.image_urls.is_empty() {
            return Err(ApiError::Payload("No images in response".to_string()));
        }
        Ok(images)
    }

    async fn save_images(&self, post_id: i64, image_urls: &[String]) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.url(&format!("/insta-posts/{}/save-images", post_id)))
            .json(&json!({ "image_urls": image_urls }))
            .send()
            .await?;
        self.check(response).await?;
        debug!("Saved {} image urls for post {}", image_urls.len(), post_id);
        Ok(())
    }
}
