// src/resources.rs
//! Safe facade over the backend: every failure is caught here, logged,
//! surfaced as a notification, and downgraded to an empty/absent value.
//! Callers treat "empty result" and "absent result" as the uniform
//! failure signal; no error type ever crosses this boundary.

use tokio::sync::mpsc;
use tracing::error;

use crate::api::SharedBackend;
use crate::error::ApiError;
use crate::models::{
    CreateInstaPostResponse, DashboardStats, ImageRequest, InstaPost, NewInstaPost, NewProject,
    Project,
};
use crate::notify::Notifier;

/// The backend owns session truth; on 401 the client's only move is to
/// send the user to the login page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    LoginRequired,
}

#[derive(Clone)]
pub struct Resources {
    backend: SharedBackend,
    notifier: Notifier,
    session_tx: mpsc::UnboundedSender<SessionEvent>,
}

impl Resources {
    pub fn new(
        backend: SharedBackend,
        notifier: Notifier,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (session_tx, session_rx) = mpsc::unbounded_channel();
        (
            Self {
                backend,
                notifier,
                session_tx,
            },
            session_rx,
        )
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    fn handle_failure(&self, context: &str, err: &ApiError) {
        error!("{}: {}", context, err);
        if err.is_unauthenticated() {
            let _ = self.session_tx.send(SessionEvent::LoginRequired);
        }
    }

    /// `true` only when the backend confirms the session. Any failure or
    /// an explicit `authenticated: false` requests a login redirect.
    pub async fn check_auth(&self) -> bool {
        match self.backend.check_auth().await {
            Ok(auth) if auth.authenticated => true,
            Ok(_) => {
                let _ = self.session_tx.send(SessionEvent::LoginRequired);
                false
            }
            Err(e) => {
                self.handle_failure("Auth check failed", &e);
                if !e.is_unauthenticated() {
                    let _ = self.session_tx.send(SessionEvent::LoginRequired);
                }
                false
            }
        }
    }

    pub async fn logout(&self) {
        if let Err(e) = self.backend.logout().await {
            error!("Logout failed: {}", e);
        }
        // Redirect to login either way; a dead session needs no cleanup.
        let _ = self.session_tx.send(SessionEvent::LoginRequired);
    }

    pub async fn fetch_projects(&self) -> Vec<Project> {
        match self.backend.list_projects().await {
            Ok(projects) => projects,
            Err(e) => {
                self.handle_failure("Error fetching projects", &e);
                self.notifier.error(format!("Failed to load projects: {}", e));
                Vec::new()
            }
        }
    }

    pub async fn fetch_project(&self, id: i64) -> Option<Project> {
        match self.backend.get_project(id).await {
            Ok(project) => Some(project),
            Err(e) => {
                self.handle_failure("Error fetching project", &e);
                self.notifier.error(format!("Failed to load project: {}", e));
                None
            }
        }
    }

    /// Stats failures are quiet: the dashboard just shows zeros.
    pub async fn fetch_stats(&self) -> DashboardStats {
        match self.backend.stats().await {
            Ok(stats) => stats,
            Err(e) => {
                self.handle_failure("Stats error", &e);
                DashboardStats::default()
            }
        }
    }

    pub async fn create_project(&self, new: NewProject) -> Option<i64> {
        match self.backend.create_project(new).await {
            Ok(created) => created.project_id,
            Err(e) => {
                self.handle_failure("Error creating project", &e);
                self.notifier
                    .error(format!("❌ Failed to generate video: {}", e));
                None
            }
        }
    }

    pub async fn delete_project(&self, id: i64) -> bool {
        match self.backend.delete_project(id).await {
            Ok(()) => {
                self.notifier.success("Project deleted successfully");
                true
            }
            Err(e) => {
                self.handle_failure("Error deleting project", &e);
                self.notifier
                    .error(format!("Failed to delete project: {}", e));
                false
            }
        }
    }

    pub async fn fetch_insta_posts(&self) -> Vec<InstaPost> {
        match self.backend.list_insta_posts().await {
            Ok(posts) => posts,
            Err(e) => {
                self.handle_failure("Error fetching Instagram posts", &e);
                self.notifier.error("Failed to load Instagram posts");
                Vec::new()
            }
        }
    }

    pub async fn fetch_insta_post(&self, id: i64) -> Option<InstaPost> {
        match self.backend.get_insta_post(id).await {
            Ok(post) => Some(post),
            Err(e) => {
                self.handle_failure("Error fetching Instagram post", &e);
                self.notifier.error("Failed to load Instagram post");
                None
            }
        }
    }

    pub async fn delete_insta_post(&self, id: i64) -> bool {
        match self.backend.delete_insta_post(id).await {
            Ok(()) => {
                self.notifier.success("Post deleted successfully");
                true
            }
            Err(e) => {
                self.handle_failure("Error deleting Instagram post", &e);
                self.notifier.error(format!("Failed to delete post: {}", e));
                false
            }
        }
    }

    pub async fn generate_insta_post(
        &self,
        new: NewInstaPost,
    ) -> Option<CreateInstaPostResponse> {
        match self.backend.generate_insta_post(new).await {
            Ok(created) => Some(created),
            Err(e) => {
                self.handle_failure("Error generating Instagram post", &e);
                self.notifier
                    .error(format!("Failed to generate Instagram post: {}", e));
                None
            }
        }
    }

    pub async fn generate_image(&self, request: ImageRequest) -> Vec<String> {
        match self.backend.generate_image(request).await {
            Ok(images) => images.image_urls,
            Err(e) => {
                self.handle_failure("Error generating image", &e);
                self.notifier
                    .error(format!("Failed to generate banner image: {}", e));
                Vec::new()
            }
        }
    }

    /// Save failures are non-fatal: the images are already displayed, the
    /// record just will not remember them.
    pub async fn save_images(&self, post_id: i64, image_urls: &[String]) {
        if let Err(e) = self.backend.save_images(post_id, image_urls).await {
            self.handle_failure("Error saving images", &e);
        }
    }
}
