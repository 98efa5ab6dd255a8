// src/models.rs
//! Wire types for the studio backend: video projects, Instagram posts,
//! dashboard stats, and the request/response envelopes around them.
//! Status is the single source of truth for which fields are populated.

use serde::{Deserialize, Serialize};

/// Default company service description prefilled into the create-video form.
pub const DEFAULT_COMPANY_SERVICE: &str = "\
IV Infotech is a leading IT company in India, delivering scalable digital solutions globally. \
We specialize in custom mobile app development, responsive website design, and enterprise \
software that turn complex ideas into digital success. As a top-rated IT company in Mehsana, \
we empower startups and global enterprises across various industries with innovation-driven \
tech solutions to elevate their digital presence and stay ahead in today's competitive tech market.

Custom Mobile Application Development
Custom Website & Software Development
CRM & ERP Custom Software Development
E-Commerce Solution
Digital marketing
UI UX Design
Web Hosting Services";

/// Lifecycle of a video generation project. The backend only moves this
/// forward; the client never mutates it locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ProjectStatus {
    /// A terminal status requires no further automatic polling.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProjectStatus::Completed | ProjectStatus::Failed)
    }

    /// Still being generated on the backend.
    pub fn is_active(&self) -> bool {
        matches!(self, ProjectStatus::Pending | ProjectStatus::Processing)
    }

    pub fn badge(&self) -> &'static str {
        match self {
            ProjectStatus::Completed => "Completed",
            ProjectStatus::Processing => "Processing...",
            ProjectStatus::Pending => "Pending...",
            ProjectStatus::Failed => "Failed",
        }
    }
}

/// A video generation job as returned by the backend. Scene media URLs are
/// present only once status is `completed`; `error_message` only on `failed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: ProjectStatus,
    #[serde(default)]
    pub created_at: String,
    pub scene_1_img: Option<String>,
    pub scene_1_vid: Option<String>,
    pub scene_2_img: Option<String>,
    pub scene_2_vid: Option<String>,
    pub error_message: Option<String>,
}

impl Project {
    /// All four scene URLs, in render order, when the project is completed.
    pub fn scene_media(&self) -> Option<[&str; 4]> {
        if self.status != ProjectStatus::Completed {
            return None;
        }
        Some([
            self.scene_1_img.as_deref()?,
            self.scene_1_vid.as_deref()?,
            self.scene_2_img.as_deref()?,
            self.scene_2_vid.as_deref()?,
        ])
    }
}

/// Generation mode for an Instagram post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PostMode {
    Marketing,
    Hiring,
}

impl PostMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostMode::Marketing => "MARKETING",
            PostMode::Hiring => "HIRING",
        }
    }
}

/// Lifecycle of an Instagram post job. `pending_image` means the text and
/// prompt are generated but the banner image is not; the UI stops automatic
/// polling there without treating the post as fully terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstaStatus {
    Processing,
    PendingImage,
    Completed,
    Failed,
    Error,
}

impl InstaStatus {
    /// Fully terminal: the job resolved one way or the other.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            InstaStatus::Completed | InstaStatus::Failed | InstaStatus::Error
        )
    }

    /// Whether the automatic polling loop should stop at this status.
    /// `pending_image` is a quiescent stopping point but not terminal.
    pub fn stops_polling(&self) -> bool {
        self.is_terminal() || matches!(self, InstaStatus::PendingImage)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, InstaStatus::Failed | InstaStatus::Error)
    }

    /// Wire spelling, as it appears in list-change signatures.
    pub fn as_str(&self) -> &'static str {
        match self {
            InstaStatus::Processing => "processing",
            InstaStatus::PendingImage => "pending_image",
            InstaStatus::Completed => "completed",
            InstaStatus::Failed => "failed",
            InstaStatus::Error => "error",
        }
    }
}

/// An Instagram post generation job. Hiring fields are present iff
/// `mode == Hiring`; `generated_image_urls` is a JSON-encoded array the
/// backend may set after initial completion, so re-fetch before rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstaPost {
    pub id: i64,
    pub keyword: String,
    pub mode: PostMode,
    pub status: InstaStatus,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub concept: Option<String>,
    pub address_line: Option<String>,
    pub primary_hex: Option<String>,
    pub secondary_hex: Option<String>,
    pub final_prompt: Option<String>,
    pub position: Option<String>,
    pub experience: Option<String>,
    pub location: Option<String>,
    pub generated_image_urls: Option<String>,
    pub error_message: Option<String>,
    #[serde(default)]
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl InstaPost {
    /// Card/detail headline: generated title, falling back to the keyword.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.keyword)
    }

    /// Parse the JSON-encoded `generated_image_urls` column. An absent or
    /// malformed value renders the same as "no images yet".
    pub fn saved_image_urls(&self) -> Vec<String> {
        let Some(raw) = self.generated_image_urls.as_deref() else {
            return Vec::new();
        };
        match serde_json::from_str::<Vec<String>>(raw) {
            Ok(urls) => urls,
            Err(e) => {
                tracing::warn!("Malformed generated_image_urls on post {}: {}", self.id, e);
                Vec::new()
            }
        }
    }
}

/// Summary counters shown on the dashboard view.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    #[serde(default)]
    pub total_videos: i64,
    #[serde(default)]
    pub total_insta_posts: i64,
    #[serde(default)]
    pub custom_characters: i64,
}

/// An uploaded file carried into a multipart request.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub mime: String,
}

impl Upload {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>, mime: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
            mime: mime.into(),
        }
    }
}

/// Submission payload for a new video project.
#[derive(Debug, Clone)]
pub struct NewProject {
    pub title: String,
    pub raw_description: String,
    pub company_service: String,
    pub character_image: Option<Upload>,
}

/// Extra fields required when generating a HIRING post.
#[derive(Debug, Clone)]
pub struct HiringFields {
    pub position: String,
    pub experience: String,
    pub location: String,
    pub post: String,
}

/// Submission payload for a new Instagram post.
#[derive(Debug, Clone)]
pub struct NewInstaPost {
    pub keyword: String,
    pub mode: PostMode,
    pub logo: Option<Upload>,
    pub character: Option<Upload>,
    pub hiring: Option<HiringFields>,
}

/// Source imagery for banner generation: fresh uploads, or the images the
/// backend already stored for a post.
#[derive(Debug, Clone)]
pub enum ImageSource {
    Uploads {
        logo: Option<Upload>,
        character: Option<Upload>,
    },
    StoredPost {
        post_id: i64,
    },
}

/// Request payload for `POST /generate-image`.
#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub final_prompt: String,
    pub source: ImageSource,
    pub aspect_ratio: String,
    pub resolution: String,
}

impl ImageRequest {
    /// The 1:1 / 1K banner request the dashboard always issues.
    pub fn banner(final_prompt: impl Into<String>, source: ImageSource) -> Self {
        Self {
            final_prompt: final_prompt.into(),
            source,
            aspect_ratio: "1:1".to_string(),
            resolution: "1K".to_string(),
        }
    }
}

/// `POST /projects` response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProjectResponse {
    #[serde(default)]
    pub success: bool,
    pub project_id: Option<i64>,
    pub error: Option<String>,
}

/// `POST /generate-insta-post` response: the created record's id plus
/// whatever prompt fields the backend already filled in.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateInstaPostResponse {
    pub id: i64,
    pub status: Option<InstaStatus>,
}

/// `POST /generate-image` response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedImages {
    #[serde(default)]
    pub image_urls: Vec<String>,
}

/// `GET /check-auth` response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthCheck {
    #[serde(default)]
    pub authenticated: bool,
}
