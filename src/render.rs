// src/render.rs
//! Card and detail renderers. Each function builds an HTML fragment from
//! a resource record; which fields get rendered is driven by the record's
//! status, never by assuming media fields are present.

use chrono::NaiveDateTime;

use crate::models::{InstaPost, InstaStatus, PostMode, Project, ProjectStatus};

/// Cards per page on the full project list.
pub const PROJECTS_PER_PAGE: usize = 10;
/// Cards shown on the dashboard's recent strip.
pub const RECENT_PROJECTS: usize = 4;

const DEFAULT_PRIMARY_HEX: &str = "#FFD700";
const DEFAULT_SECONDARY_HEX: &str = "#FF8C00";

/// Minimal HTML escaping for interpolated record fields.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    None
}

/// "Nov 5" style short date for cards.
pub fn short_date(raw: &str) -> String {
    match parse_timestamp(raw) {
        Some(dt) => dt.format("%b %-d").to_string(),
        None => raw.to_string(),
    }
}

/// "Nov 5, 2025" style full date for detail headers.
pub fn full_date(raw: &str) -> String {
    match parse_timestamp(raw) {
        Some(dt) => dt.format("%b %-d, %Y").to_string(),
        None => raw.to_string(),
    }
}

/// One project card. The recent-strip variant (`is_recent`) never shows a
/// delete button; deletion is only offered from the full list.
pub fn project_card(project: &Project, is_recent: bool) -> String {
    let title = escape(&project.title);
    let description = escape(&project.description);
    let date = short_date(&project.created_at);
    let badge = project.status.badge();

    let media = match project.status {
        ProjectStatus::Completed => match &project.scene_1_img {
            Some(url) => format!(
                r#"<img src="{}" alt="{}" class="project-featured-image">"#,
                escape(url),
                title
            ),
            None => r#"<div class="project-media-placeholder"></div>"#.to_string(),
        },
        ProjectStatus::Pending | ProjectStatus::Processing => format!(
            r#"<div class="project-media-processing">
    <div class="spinner"></div>
    <div class="processing-status">{badge}</div>
    <div class="processing-note">Generating your AI video...</div>
</div>"#
        ),
        ProjectStatus::Failed => {
            let message = project
                .error_message
                .as_deref()
                .unwrap_or("An error occurred during video generation");
            format!(
                r#"<div class="project-media-failed">
    <div class="failed-icon"></div>
    <div class="failed-status">Generation Failed</div>
    <div class="failed-note">{}</div>
</div>"#,
                escape(message)
            )
        }
    };

    let delete_button = if is_recent {
        String::new()
    } else {
        format!(
            r#"<button class="project-btn" data-action="delete" data-project-id="{}">Delete</button>"#,
            project.id
        )
    };
    let actions = match project.status {
        ProjectStatus::Completed => format!(
            r#"<div class="project-actions-row">
    <button class="project-btn" data-action="view" data-project-id="{id}">View</button>
    <button class="project-btn" data-action="download" data-project-id="{id}">Download</button>
</div>
{delete_button}"#,
            id = project.id
        ),
        ProjectStatus::Pending | ProjectStatus::Processing => format!(
            r#"<button class="project-btn" data-action="view" data-project-id="{}">View Status</button>"#,
            project.id
        ),
        ProjectStatus::Failed => format!(
            r#"<div class="project-actions-row">
    <button class="project-btn" data-action="view" data-project-id="{id}">View Error</button>
    {delete_button}
</div>"#,
            id = project.id
        ),
    };

    format!(
        r#"<div class="project-card" data-project-id="{id}">
  <div class="project-featured-image-container">{media}</div>
  <div class="project-content">
    <div class="project-header">
      <h3 class="project-title">{title}</h3>
      <div class="project-info">
        <span class="project-date">{date}</span>
        <span class="project-badge">{badge}</span>
      </div>
    </div>
    <p class="project-description">{description}</p>
    <div class="project-actions">{actions}</div>
  </div>
</div>"#,
        id = project.id
    )
}

/// Dashboard recent strip: the first four projects, or an empty state.
pub fn recent_projects(projects: &[Project]) -> String {
    if projects.is_empty() {
        return r#"<div class="empty-state">
  <p class="empty-title">No projects yet</p>
  <p class="empty-hint">Create your first AI video to get started</p>
</div>"#
            .to_string();
    }
    projects
        .iter()
        .take(RECENT_PROJECTS)
        .map(|p| project_card(p, true))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Full project list: one page of cards plus pagination controls when
/// more than one page exists. `page` is 1-based and clamped to range.
pub fn projects_page(projects: &[Project], page: usize) -> String {
    if projects.is_empty() {
        return r#"<div class="empty-state">
  <p class="empty-title">No projects found</p>
  <p class="empty-hint">Start creating amazing AI videos</p>
  <button class="empty-cta" data-action="goto-create">Create New Project</button>
</div>"#
            .to_string();
    }

    let total_pages = projects.len().div_ceil(PROJECTS_PER_PAGE);
    let page = page.clamp(1, total_pages);
    let start = (page - 1) * PROJECTS_PER_PAGE;
    let end = (start + PROJECTS_PER_PAGE).min(projects.len());

    let mut html = projects[start..end]
        .iter()
        .map(|p| project_card(p, false))
        .collect::<Vec<_>>()
        .join("\n");

    if total_pages > 1 {
        html.push_str(&format!(
            "\n<div class=\"pagination\">\n  \
             <button class=\"page-btn\" data-page=\"{prev}\"{prev_disabled}>Previous</button>\n  \
             <button class=\"page-btn\" data-page=\"{next}\"{next_disabled}>Next</button>\n  \
             <span class=\"page-info\">Page {page} of {total_pages} ({total} total projects)</span>\n\
             </div>",
            prev = page.saturating_sub(1),
            prev_disabled = if page == 1 { " disabled" } else { "" },
            next = page + 1,
            next_disabled = if page == total_pages { " disabled" } else { "" },
            total = projects.len(),
        ));
    }
    html
}

/// Scene grid for a completed project. Returns None until all four media
/// URLs exist; callers must not render scenes from a partial record.
pub fn scene_grid(project: &Project) -> Option<String> {
    let [img1, vid1, img2, vid2] = project.scene_media()?;
    Some(format!(
        r#"<div class="results-grid">
  <div class="scene-card">
    <div class="scene-header"><h3 class="scene-title">Scene 1</h3><span class="scene-badge">Problem/Intro</span></div>
    <img src="{img1}" alt="Scene 1 Image" class="scene-image">
    <video src="{vid1}" class="scene-video" controls></video>
  </div>
  <div class="scene-card">
    <div class="scene-header"><h3 class="scene-title">Scene 2</h3><span class="scene-badge scene-badge-success">Solution/Growth</span></div>
    <img src="{img2}" alt="Scene 2 Image" class="scene-image">
    <video src="{vid2}" class="scene-video" controls></video>
  </div>
</div>"#,
        img1 = escape(img1),
        vid1 = escape(vid1),
        img2 = escape(img2),
        vid2 = escape(vid2),
    ))
}

/// Full project detail view: scenes when completed, a failure panel when
/// failed. Active projects are shown via the loading view, not this one.
pub fn project_detail(project: &Project) -> String {
    let subtitle = format!(
        "Created on {} \u{2022} {}",
        full_date(&project.created_at),
        format!("{:?}", project.status).to_uppercase()
    );

    let body = match project.status {
        ProjectStatus::Completed => {
            let scenes = scene_grid(project).unwrap_or_else(|| {
                r#"<p class="empty-hint">Scene media is not available yet.</p>"#.to_string()
            });
            format!(
                r#"<div class="results-wrapper">
  <div class="results-header">
    <h2 class="section-title-sm">Generated Video Scenes</h2>
    <button class="btn-text" data-action="download-all">Download All</button>
  </div>
  {scenes}
</div>"#
            )
        }
        ProjectStatus::Failed => format!(
            r#"<div class="failure-panel">
  <h2 class="failure-title">Generation Failed</h2>
  <p class="failure-message">{}</p>
</div>"#,
            escape(
                project
                    .error_message
                    .as_deref()
                    .unwrap_or("An error occurred during video generation")
            )
        ),
        ProjectStatus::Pending | ProjectStatus::Processing => {
            r#"<div class="loading-panel"><div class="spinner"></div></div>"#.to_string()
        }
    };

    format!(
        r#"<section class="project-detail">
  <h1 class="view-title">{}</h1>
  <p class="view-subtitle">{}</p>
  {body}
</section>"#,
        escape(&project.title),
        escape(&subtitle),
    )
}

fn mode_badge(mode: PostMode) -> String {
    let class = match mode {
        PostMode::Hiring => "mode-badge mode-hiring",
        PostMode::Marketing => "mode-badge mode-marketing",
    };
    format!(r#"<span class="{class}">{}</span>"#, mode.as_str())
}

/// One Instagram post card. Processing cards show a shimmer and disable
/// deletion; failed cards surface the error message.
pub fn insta_card(post: &InstaPost) -> String {
    let is_processing = post.status == InstaStatus::Processing;
    let is_failed = post.status.is_failure();
    let primary = post.primary_hex.as_deref().unwrap_or(DEFAULT_PRIMARY_HEX);
    let secondary = post
        .secondary_hex
        .as_deref()
        .unwrap_or(DEFAULT_SECONDARY_HEX);

    let state_class = if is_processing {
        "is-processing"
    } else if is_failed {
        "is-failed"
    } else {
        "is-completed"
    };

    let heading = if is_processing {
        "Generating Instagram Post...".to_string()
    } else if is_failed {
        "Generation Failed".to_string()
    } else {
        escape(post.display_title())
    };

    let note = if is_processing {
        r#"<p class="card-note">Creating AI-powered content...</p>"#.to_string()
    } else if is_failed {
        format!(
            r#"<p class="card-note card-note-error">{}</p>"#,
            escape(
                post.error_message
                    .as_deref()
                    .unwrap_or("An error occurred during generation")
            )
        )
    } else {
        match post.subtitle.as_deref() {
            Some(subtitle) if !subtitle.is_empty() => {
                format!(r#"<p class="card-note">{}</p>"#, escape(subtitle))
            }
            _ => String::new(),
        }
    };

    let shimmer = if is_processing {
        r#"<div class="insta-shimmer"></div>"#
    } else {
        ""
    };
    let meta_badge = if is_processing {
        r#"<span class="status-badge status-processing">Processing</span>"#.to_string()
    } else if is_failed {
        r#"<span class="status-badge status-failed">Failed</span>"#.to_string()
    } else {
        mode_badge(post.mode)
    };

    format!(
        r#"<div class="insta-post-card {state_class}" data-post-id="{id}" data-status="{status}" style="--primary: {primary}; --secondary: {secondary};">
  {shimmer}
  <div class="card-top">
    <h3 class="card-title">{heading}</h3>
    {note}
    <button class="card-delete" data-action="delete-post" data-post-id="{id}"{delete_disabled} title="{delete_title}"></button>
  </div>
  <div class="card-meta">
    <div class="meta-field"><span class="meta-label">Keyword</span><span class="meta-value">{keyword}</span></div>
    <div class="meta-field"><span class="meta-label">{meta_label}</span>{meta_badge}</div>
    <div class="meta-field"><span class="meta-label">Created</span><span class="meta-value">{date}</span></div>
  </div>
</div>"#,
        id = post.id,
        status = post.status.as_str(),
        primary = escape(primary),
        secondary = escape(secondary),
        keyword = escape(&post.keyword),
        meta_label = if is_processing || is_failed { "Status" } else { "Mode" },
        date = full_date(&post.created_at),
        delete_disabled = if is_processing { " disabled" } else { "" },
        delete_title = if is_processing {
            "Cannot delete while processing"
        } else {
            "Delete Post"
        },
    )
}

/// Instagram post list, or its empty state.
pub fn insta_posts_list(posts: &[InstaPost]) -> String {
    if posts.is_empty() {
        return r#"<div class="empty-state">
  <p class="empty-title">No Instagram posts found</p>
  <p class="empty-hint">Generate your first AI-powered post</p>
</div>"#
            .to_string();
    }
    posts
        .iter()
        .map(insta_card)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Saved banner images, rendered from the re-parsed URL list.
pub fn saved_images(urls: &[String]) -> String {
    if urls.is_empty() {
        return r#"<div class="banner-placeholder"><p>No image generated yet</p></div>"#
            .to_string();
    }
    urls.iter()
        .map(|url| format!(r#"<img src="{}" class="banner-image" alt="Generated banner">"#, escape(url)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Full post detail view. The hiring block renders only for HIRING posts
/// with at least one populated job field; the prompt panel only when a
/// final prompt exists.
pub fn insta_detail(post: &InstaPost) -> String {
    let badge = mode_badge(post.mode);
    let title = escape(post.display_title());
    let subtitle = match post.subtitle.as_deref() {
        Some(s) if !s.is_empty() => format!(r#"<p class="detail-subtitle">{}</p>"#, escape(s)),
        _ => String::new(),
    };
    let primary = escape(post.primary_hex.as_deref().unwrap_or(DEFAULT_PRIMARY_HEX));
    let secondary = escape(post.secondary_hex.as_deref().unwrap_or(DEFAULT_SECONDARY_HEX));

    let hiring_block = if post.mode == PostMode::Hiring
        && (post.position.is_some() || post.experience.is_some() || post.location.is_some())
    {
        let field = |label: &str, value: &Option<String>| match value.as_deref() {
            Some(v) => format!(
                r#"<div class="job-field"><span class="meta-label">{label}</span><span class="meta-value">{}</span></div>"#,
                escape(v)
            ),
            None => String::new(),
        };
        format!(
            r#"<div class="hiring-details">
  <h3>Job Details</h3>
  {}{}{}
</div>"#,
            field("Position", &post.position),
            field("Experience", &post.experience),
            field("Location", &post.location),
        )
    } else {
        String::new()
    };

    let prompt_panel = match post.final_prompt.as_deref() {
        Some(prompt) if !prompt.is_empty() => format!(
            r#"<div class="prompt-columns">
  <div class="prompt-panel">
    <div class="prompt-header"><h3>Final AI Prompt</h3><button data-action="edit-prompt">Edit</button></div>
    <pre class="prompt-preview">{}</pre>
    <button class="submit-btn" data-action="generate-banner" data-post-id="{}">Generate Banner Image</button>
  </div>
  <div class="banner-panel">
    <h3>Banner Preview</h3>
    {}
  </div>
</div>"#,
            escape(prompt),
            post.id,
            saved_images(&post.saved_image_urls()),
        ),
        _ => String::new(),
    };

    format!(
        r#"<section class="insta-detail" data-post-id="{id}">
  <div class="detail-header">
    {badge}
    <h2 class="detail-title">{title}</h2>
    {subtitle}
    <p class="detail-keyword"><strong>Keyword:</strong> {keyword}</p>
    <div class="color-palette">
      <div class="swatch" style="background: {primary};" title="Primary {primary}"></div>
      <div class="swatch" style="background: {secondary};" title="Secondary {secondary}"></div>
    </div>
  </div>
  {hiring_block}
  {prompt_panel}
</section>"#,
        id = post.id,
        keyword = escape(&post.keyword),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DashboardStats;

    fn project(status: ProjectStatus) -> Project {
        Project {
            id: 7,
            title: "Launch video".into(),
            description: "A product launch".into(),
            status,
            created_at: "2025-11-05T10:30:00".into(),
            scene_1_img: None,
            scene_1_vid: None,
            scene_2_img: None,
            scene_2_vid: None,
            error_message: None,
        }
    }

    fn post(status: InstaStatus) -> InstaPost {
        InstaPost {
            id: 42,
            keyword: "coffee".into(),
            mode: PostMode::Marketing,
            status,
            title: Some("Morning Brew".into()),
            subtitle: Some("Best in town".into()),
            concept: None,
            address_line: None,
            primary_hex: Some("#112233".into()),
            secondary_hex: Some("#445566".into()),
            final_prompt: Some("A warm cafe scene".into()),
            position: None,
            experience: None,
            location: None,
            generated_image_urls: None,
            error_message: None,
            created_at: "2025-11-05T10:30:00".into(),
            updated_at: None,
        }
    }

    #[test]
    fn completed_card_without_media_has_no_img_tag() {
        // Status says completed but the record lacks media; must not
        // fabricate an image URL.
        let html = project_card(&project(ProjectStatus::Completed), false);
        assert!(!html.contains("<img"));
        assert!(html.contains("Completed"));
    }

    #[test]
    fn recent_card_never_offers_delete() {
        let mut p = project(ProjectStatus::Completed);
        p.scene_1_img = Some("http://cdn/img1.png".into());
        let recent = project_card(&p, true);
        let full = project_card(&p, false);
        assert!(!recent.contains("data-action=\"delete\""));
        assert!(full.contains("data-action=\"delete\""));
    }

    #[test]
    fn failed_card_shows_error_message() {
        let mut p = project(ProjectStatus::Failed);
        p.error_message = Some("GPU quota exceeded".into());
        let html = project_card(&p, false);
        assert!(html.contains("Generation Failed"));
        assert!(html.contains("GPU quota exceeded"));
    }

    #[test]
    fn pagination_appears_only_beyond_one_page() {
        let many: Vec<Project> = (0..25)
            .map(|i| {
                let mut p = project(ProjectStatus::Processing);
                p.id = i;
                p
            })
            .collect();
        let page1 = projects_page(&many, 1);
        assert!(page1.contains("Page 1 of 3 (25 total projects)"));
        assert_eq!(page1.matches("project-card").count(), 10);

        let page3 = projects_page(&many, 3);
        assert_eq!(page3.matches("project-card").count(), 5);

        let few: Vec<Project> = (0..3)
            .map(|i| {
                let mut p = project(ProjectStatus::Processing);
                p.id = i;
                p
            })
            .collect();
        assert!(!projects_page(&few, 1).contains("pagination"));
    }

    #[test]
    fn scene_grid_requires_all_four_urls() {
        let mut p = project(ProjectStatus::Completed);
        p.scene_1_img = Some("a".into());
        p.scene_1_vid = Some("b".into());
        p.scene_2_img = Some("c".into());
        assert!(scene_grid(&p).is_none());
        p.scene_2_vid = Some("d".into());
        assert!(scene_grid(&p).is_some());
    }

    #[test]
    fn processing_insta_card_disables_delete() {
        let html = insta_card(&post(InstaStatus::Processing));
        assert!(html.contains("Generating Instagram Post..."));
        assert!(html.contains(" disabled"));
        assert!(html.contains("Cannot delete while processing"));
    }

    #[test]
    fn insta_card_status_attribute_uses_wire_spelling() {
        let html = insta_card(&post(InstaStatus::PendingImage));
        assert!(html.contains(r#"data-status="pending_image""#));
        assert!(!html.contains("PendingImage"));
        let html = insta_card(&post(InstaStatus::Processing));
        assert!(html.contains(r#"data-status="processing""#));
    }

    #[test]
    fn hiring_block_only_for_hiring_posts_with_fields() {
        let mut p = post(InstaStatus::Completed);
        p.mode = PostMode::Hiring;
        assert!(!insta_detail(&p).contains("Job Details"));
        p.position = Some("Barista".into());
        let html = insta_detail(&p);
        assert!(html.contains("Job Details"));
        assert!(html.contains("Barista"));
        p.mode = PostMode::Marketing;
        assert!(!insta_detail(&p).contains("Job Details"));
    }

    #[test]
    fn detail_reparses_saved_image_urls() {
        let mut p = post(InstaStatus::Completed);
        p.generated_image_urls =
            Some(r#"["http://cdn/banner1.png","http://cdn/banner2.png"]"#.into());
        let html = insta_detail(&p);
        assert!(html.contains("banner1.png"));
        assert!(html.contains("banner2.png"));
        assert!(!html.contains("No image generated yet"));
    }

    #[test]
    fn escapes_untrusted_fields() {
        let mut p = post(InstaStatus::Completed);
        p.title = Some("<script>alert(1)</script>".into());
        let html = insta_card(&p);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn stats_defaults_render_as_zero() {
        let stats = DashboardStats::default();
        assert_eq!(stats.total_videos, 0);
    }
}
