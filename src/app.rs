// src/app.rs
//! The dashboard orchestrator. Wires the resource facade, pollers, list
//! watcher, progress simulator, and router together, and owns the two
//! pieces of interaction state the views share: the create-panel mode
//! and the pending-deletion confirmation.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};
use tracing::info;

use crate::api::SharedBackend;
use crate::config::Config;
use crate::list_watch::{ListEvent, ListWatcher};
use crate::models::{DashboardStats, InstaStatus, NewInstaPost, NewProject, PostMode};
use crate::models::{ImageRequest, ImageSource, Project};
use crate::notify::{Notification, Notifier};
use crate::poller::{InstaTicket, JobKind, PollEvent, PollSettings, PollerManager};
use crate::progress::{ProgressFrame, ProgressSimulator};
use crate::render;
use crate::resources::{Resources, SessionEvent};
use crate::router::{Router, View, ViewLoader};

/// Which job, if any, is awaiting deletion confirmation. One tagged value
/// instead of two independent nullable ids: requesting one kind clears
/// the other, and confirm dispatches on the tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingDeletion {
    None,
    Project(i64),
    InstaPost(i64),
}

/// The create view's three exclusive panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreatePanel {
    Form,
    Loading,
    Results,
}

/// Rendered output of every view, written by loads and event handlers,
/// read by whatever front end displays it.
pub struct Screen {
    pub stats: Mutex<DashboardStats>,
    pub recent_projects: Mutex<String>,
    pub projects: Mutex<String>,
    pub insta_posts: Mutex<String>,
    pub project_detail: Mutex<String>,
    pub insta_detail: Mutex<String>,
    pub create_panel: Mutex<CreatePanel>,
    pub insta_form_mode: Mutex<PostMode>,
}

impl Default for Screen {
    fn default() -> Self {
        Self {
            stats: Mutex::new(DashboardStats::default()),
            recent_projects: Mutex::new(String::new()),
            projects: Mutex::new(String::new()),
            insta_posts: Mutex::new(String::new()),
            project_detail: Mutex::new(String::new()),
            insta_detail: Mutex::new(String::new()),
            create_panel: Mutex::new(CreatePanel::Form),
            insta_form_mode: Mutex::new(PostMode::Marketing),
        }
    }
}

impl Screen {
    pub fn set_create_panel(&self, panel: CreatePanel) {
        *self.create_panel.lock().unwrap() = panel;
    }

    pub fn create_panel(&self) -> CreatePanel {
        *self.create_panel.lock().unwrap()
    }

    pub fn set_insta_form_mode(&self, mode: PostMode) {
        *self.insta_form_mode.lock().unwrap() = mode;
    }

    pub fn insta_form_mode(&self) -> PostMode {
        *self.insta_form_mode.lock().unwrap()
    }
}

/// Per-view load callbacks the router dispatches on every activation.
#[derive(Clone)]
struct Loader {
    resources: Resources,
    screen: Arc<Screen>,
}

#[async_trait]
impl ViewLoader for Loader {
    async fn load_dashboard(&self) {
        let stats = self.resources.fetch_stats().await;
        *self.screen.stats.lock().unwrap() = stats;
        let projects = self.resources.fetch_projects().await;
        *self.screen.recent_projects.lock().unwrap() = render::recent_projects(&projects);
    }

    async fn load_projects(&self) {
        let projects = self.resources.fetch_projects().await;
        *self.screen.projects.lock().unwrap() = render::projects_page(&projects, 1);
    }

    async fn reset_create_form(&self) {
        self.screen.set_create_panel(CreatePanel::Form);
    }

    async fn load_insta_posts(&self) {
        let posts = self.resources.fetch_insta_posts().await;
        *self.screen.insta_posts.lock().unwrap() = render::insta_posts_list(&posts);
    }

    async fn reset_insta_form(&self) {
        self.screen.set_insta_form_mode(PostMode::Marketing);
    }

    async fn load_insta_post_detail(&self, id: i64) {
        let Some(post) = self.resources.fetch_insta_post(id).await else {
            self.resources.notifier().error("Failed to load post details");
            return;
        };
        if post.status == InstaStatus::Processing {
            self.resources
                .notifier()
                .info("Post is still being generated. Please wait...");
            return;
        }
        *self.screen.insta_detail.lock().unwrap() = render::insta_detail(&post);
    }
}

/// Receiver ends of every outbound channel the dashboard feeds.
pub struct Channels {
    pub toasts: mpsc::UnboundedReceiver<Notification>,
    pub session: mpsc::UnboundedReceiver<SessionEvent>,
    pub poll_events: mpsc::UnboundedReceiver<PollEvent>,
    pub list_events: mpsc::UnboundedReceiver<ListEvent>,
    pub progress: watch::Receiver<ProgressFrame>,
}

pub struct Dashboard {
    resources: Resources,
    pollers: PollerManager,
    list_watch: ListWatcher,
    progress: ProgressSimulator,
    router: Router<Loader>,
    screen: Arc<Screen>,
    pending_deletion: PendingDeletion,
}

impl Dashboard {
    pub fn new(backend: SharedBackend, config: &Config) -> (Self, Channels) {
        let (notifier, toasts) = Notifier::channel();
        let (resources, session) = Resources::new(backend, notifier);
        let (pollers, poll_events) =
            PollerManager::new(resources.clone(), PollSettings::from(config));
        let (list_watch, list_events) =
            ListWatcher::new(resources.clone(), config.list_watch_interval);
        let (progress, progress_rx) = ProgressSimulator::new();
        let screen = Arc::new(Screen::default());
        let router = Router::new(Loader {
            resources: resources.clone(),
            screen: Arc::clone(&screen),
        });

        (
            Self {
                resources,
                pollers,
                list_watch,
                progress,
                router,
                screen,
                pending_deletion: PendingDeletion::None,
            },
            Channels {
                toasts,
                session,
                poll_events,
                list_events,
                progress: progress_rx,
            },
        )
    }

    pub fn screen(&self) -> &Arc<Screen> {
        &self.screen
    }

    pub fn current_view(&self) -> View {
        self.router.current()
    }

    pub fn pending_deletion(&self) -> PendingDeletion {
        self.pending_deletion
    }

    /// Page-load flow: session check first, then the initial view from
    /// the URL fragment, then resume tracking any job the backend still
    /// reports as in flight. Returns false when a login is required.
    pub async fn startup(&mut self, fragment: Option<&str>) -> bool {
        if !self.resources.check_auth().await {
            return false;
        }

        self.router.handle_initial_fragment(fragment).await;

        let projects = self.resources.fetch_projects().await;
        if let Some(active) = projects.iter().find(|p| p.status.is_active()) {
            info!("Resuming tracking of active project {}", active.id);
            // Surface the loading panel unless the fragment already chose a
            // view. Navigating resets the panel to Form, so do it first.
            if fragment.and_then(View::parse_fragment).is_none() {
                self.router.switch_view(View::Create).await;
            }
            self.screen.set_create_panel(CreatePanel::Loading);
            self.progress.start();
            self.pollers.start_video_poll(active.id);
        }

        let posts = self.resources.fetch_insta_posts().await;
        if posts.iter().any(|p| p.status == InstaStatus::Processing) {
            self.list_watch.start();
        }
        true
    }

    pub async fn navigate(&mut self, view: View) {
        self.router.switch_view(view).await;
    }

    pub async fn open_insta_post(&mut self, post_id: i64) {
        self.router.view_insta_post(post_id, true).await;
    }

    pub async fn go_back(&mut self) {
        self.router.back().await;
    }

    /// Submit a video project. The loading panel and progress animation
    /// start optimistically; a rejected submission reverts to the form.
    pub async fn submit_video(&mut self, new: NewProject) {
        self.screen.set_create_panel(CreatePanel::Loading);
        self.progress.start();

        match self.resources.create_project(new).await {
            Some(project_id) => {
                self.resources
                    .notifier()
                    .success("✨ Video generation started! Tracking progress...");
                self.pollers.start_video_poll(project_id);
            }
            None => {
                self.progress.abort();
                self.screen.set_create_panel(CreatePanel::Form);
            }
        }
    }

    /// Submit an Instagram post. Returns the polling ticket on success so
    /// callers may await the outcome; the poll runs regardless.
    pub async fn submit_insta(&mut self, new: NewInstaPost) -> Option<InstaTicket> {
        if new.keyword.trim().is_empty() {
            self.resources
                .notifier()
                .error("Please fill all required fields");
            return None;
        }
        if new.mode == PostMode::Hiring {
            let complete = new.hiring.as_ref().is_some_and(|h| {
                !h.position.trim().is_empty()
                    && !h.experience.trim().is_empty()
                    && !h.location.trim().is_empty()
            });
            if !complete {
                self.resources
                    .notifier()
                    .error("Please fill all hiring fields");
                return None;
            }
        }
        if new.logo.is_none() || new.character.is_none() {
            self.resources
                .notifier()
                .info("No files uploaded. Using default logo and character...");
        }
        self.resources
            .notifier()
            .info("Starting Instagram post generation...");

        let created = self.resources.generate_insta_post(new).await?;
        self.resources
            .notifier()
            .success("Prompt generated successfully! Redirecting to Instagram Posts...");
        self.router.switch_view(View::InstaPosts).await;
        self.list_watch.start();
        Some(self.pollers.start_insta_poll(created.id))
    }

    /// Generate a banner for the post currently in the detail view, using
    /// the (possibly edited) prompt and the post's stored source imagery.
    /// A failed save is non-fatal; the record is re-fetched before
    /// re-rendering because images land on it out of band.
    pub async fn generate_banner(&mut self, post_id: i64, prompt: &str) {
        if prompt.trim().is_empty() {
            self.resources
                .notifier()
                .error("Please enter a prompt for image generation.");
            return;
        }
        self.resources
            .notifier()
            .info("Generating banner images using edited prompt...");

        let request = ImageRequest::banner(prompt, ImageSource::StoredPost { post_id });
        let urls = self.resources.generate_image(request).await;
        if urls.is_empty() {
            return;
        }

        self.resources.save_images(post_id, &urls).await;
        self.resources
            .notifier()
            .success("Banner images generated and saved successfully!");

        if let Some(post) = self.resources.fetch_insta_post(post_id).await {
            *self.screen.insta_detail.lock().unwrap() = render::insta_detail(&post);
        }
    }

    pub fn request_delete_project(&mut self, project_id: i64) {
        self.pending_deletion = PendingDeletion::Project(project_id);
    }

    pub fn request_delete_insta_post(&mut self, post_id: i64) {
        self.pending_deletion = PendingDeletion::InstaPost(post_id);
    }

    pub fn cancel_delete(&mut self) {
        self.pending_deletion = PendingDeletion::None;
    }

    /// Confirm the pending deletion. A failed delete (already gone,
    /// backend down) surfaces its notification from the facade and leaves
    /// the rendered lists untouched.
    pub async fn confirm_delete(&mut self) {
        let pending = std::mem::replace(&mut self.pending_deletion, PendingDeletion::None);
        match pending {
            PendingDeletion::None => {
                self.resources
                    .notifier()
                    .error("No project selected for deletion");
            }
            PendingDeletion::Project(id) => {
                self.resources.notifier().info("Deleting project...");
                if self.resources.delete_project(id).await {
                    self.refresh_projects().await;
                    self.refresh_dashboard().await;
                }
            }
            PendingDeletion::InstaPost(id) => {
                if self.resources.delete_insta_post(id).await {
                    self.refresh_insta_list().await;
                    self.refresh_dashboard().await;
                }
            }
        }
    }

    /// React to a poller transition. The finished record arrives in the
    /// event itself.
    pub async fn handle_poll_event(&mut self, event: PollEvent) {
        match event {
            PollEvent::VideoCompleted(project) => {
                self.progress.complete();
                // Let the completion transition play out before swapping
                // in the results.
                tokio::time::sleep(Duration::from_millis(2000)).await;
                self.show_video_results(&project);
                self.refresh_projects().await;
                self.refresh_dashboard().await;
            }
            PollEvent::VideoFailed(_) => {
                self.progress.abort();
                self.screen.set_create_panel(CreatePanel::Form);
            }
            PollEvent::InstaPromptReady(_)
            | PollEvent::InstaCompleted(_)
            | PollEvent::InstaFailed(_)
            | PollEvent::InstaTimedOut(_) => {
                self.refresh_insta_list().await;
                self.refresh_dashboard().await;
            }
        }
    }

    /// React to a list-watch tick that saw a change, or the watch ending.
    pub async fn handle_list_event(&mut self, event: ListEvent) {
        let posts = match event {
            ListEvent::Changed(posts) | ListEvent::Settled(posts) => posts,
        };
        *self.screen.insta_posts.lock().unwrap() = render::insta_posts_list(&posts);
        self.refresh_dashboard().await;
    }

    /// Tear down background work; used on logout.
    pub async fn shutdown(&mut self) {
        self.pollers.stop(JobKind::Video);
        self.pollers.stop(JobKind::Insta);
        self.list_watch.stop();
        self.progress.abort();
    }

    pub async fn logout(&mut self) {
        self.shutdown().await;
        self.resources.logout().await;
    }

    fn show_video_results(&self, project: &Project) {
        *self.screen.project_detail.lock().unwrap() = render::project_detail(project);
        self.screen.set_create_panel(CreatePanel::Results);
    }

    async fn refresh_dashboard(&self) {
        let stats = self.resources.fetch_stats().await;
        *self.screen.stats.lock().unwrap() = stats;
        let projects = self.resources.fetch_projects().await;
        *self.screen.recent_projects.lock().unwrap() = render::recent_projects(&projects);
    }

    async fn refresh_projects(&self) {
        let projects = self.resources.fetch_projects().await;
        *self.screen.projects.lock().unwrap() = render::projects_page(&projects, 1);
    }

    async fn refresh_insta_list(&self) {
        let posts = self.resources.fetch_insta_posts().await;
        *self.screen.insta_posts.lock().unwrap() = render::insta_posts_list(&posts);
    }
}
