// src/poller.rs
//! Job polling state machines: re-fetch a generation job until it reaches
//! a state that needs no further automatic polling, then fire the
//! kind-specific handler exactly once.
//!
//! Each poll is a structured task guarded by a `CancellationToken`. At
//! most one poll per job kind is active: starting a new one cancels the
//! previous token before spawning, and a cancelled task applies no side
//! effects after any await. Fetches are awaited sequentially inside one
//! task, so tick results are applied in issue order by construction.

use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::Config;
use crate::models::{InstaPost, InstaStatus, Project, ProjectStatus};
use crate::resources::Resources;

/// The two job families the dashboard tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Video,
    Insta,
}

/// Terminal (or quiescent) transitions surfaced to the application layer.
/// The finished record travels inside the event; there is no shared
/// "current job" reference for renderers to race on.
#[derive(Debug, Clone)]
pub enum PollEvent {
    VideoCompleted(Project),
    VideoFailed(Project),
    /// Prompt text is ready; image generation has not run. Automatic
    /// polling stops here without firing the completion path.
    InstaPromptReady(InstaPost),
    InstaCompleted(InstaPost),
    InstaFailed(InstaPost),
    /// Attempt cap reached while still processing; resolves with the
    /// last-seen record rather than an error.
    InstaTimedOut(InstaPost),
}

/// Resolution of one insta polling run, in promise form: `Ok` for
/// prompt-ready, completed, and timed-out; `Err` carries the failure
/// message. Dropped unresolved when the poll is superseded.
pub type InstaTicket = oneshot::Receiver<Result<InstaPost, String>>;

/// Timings for both poll kinds, lifted from the runtime config.
#[derive(Debug, Clone)]
pub struct PollSettings {
    pub video_interval: Duration,
    pub insta_interval: Duration,
    pub insta_max_attempts: u32,
    pub insta_safety_timeout: Duration,
}

impl From<&Config> for PollSettings {
    fn from(config: &Config) -> Self {
        Self {
            video_interval: config.video_poll_interval,
            insta_interval: config.insta_poll_interval,
            insta_max_attempts: config.insta_max_attempts,
            insta_safety_timeout: config.insta_safety_timeout(),
        }
    }
}

struct ActivePoll {
    cancel: CancellationToken,
    _handle: JoinHandle<()>,
}

/// Owns the at-most-one-active-poll-per-kind invariant.
pub struct PollerManager {
    resources: Resources,
    settings: PollSettings,
    events: mpsc::UnboundedSender<PollEvent>,
    video: Mutex<Option<ActivePoll>>,
    insta: Mutex<Option<ActivePoll>>,
}

impl PollerManager {
    pub fn new(
        resources: Resources,
        settings: PollSettings,
    ) -> (Self, mpsc::UnboundedReceiver<PollEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        (
            Self {
                resources,
                settings,
                events,
                video: Mutex::new(None),
                insta: Mutex::new(None),
            },
            events_rx,
        )
    }

    fn slot(&self, kind: JobKind) -> &Mutex<Option<ActivePoll>> {
        match kind {
            JobKind::Video => &self.video,
            JobKind::Insta => &self.insta,
        }
    }

    /// Cancel the active poll of `kind`, if any. Safe to call when none
    /// is running.
    pub fn stop(&self, kind: JobKind) {
        if let Some(active) = self.slot(kind).lock().unwrap().take() {
            active.cancel.cancel();
            info!("Cancelled active {:?} poll", kind);
        }
    }

    fn install(&self, kind: JobKind, active: ActivePoll) {
        let mut slot = self.slot(kind).lock().unwrap();
        if let Some(previous) = slot.replace(active) {
            previous.cancel.cancel();
        }
    }

    /// Track a video project until `completed` or `failed`. No attempt
    /// cap: video jobs are expected to terminate on the backend. That gap
    /// is deliberate but loud.
    pub fn start_video_poll(&self, project_id: i64) {
        self.stop(JobKind::Video);
        info!(
            "🎬 Polling project {} every {:?} (no attempt cap)",
            project_id, self.settings.video_interval
        );

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let resources = self.resources.clone();
        let events = self.events.clone();
        let interval = self.settings.video_interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            ticker.tick().await; // consume the immediate first tick

            loop {
                tokio::select! {
                    _ = token.cancelled() => return,
                    _ = ticker.tick() => {}
                }

                // A failed fetch skips this tick; it is not a job failure.
                let Some(project) = resources.fetch_project(project_id).await else {
                    continue;
                };
                if token.is_cancelled() {
                    return;
                }

                match project.status {
                    ProjectStatus::Completed => {
                        resources
                            .notifier()
                            .success("🎉 Video generation completed successfully!");
                        let _ = events.send(PollEvent::VideoCompleted(project));
                        return;
                    }
                    ProjectStatus::Failed => {
                        let message = project
                            .error_message
                            .clone()
                            .unwrap_or_else(|| "Unknown error".to_string());
                        resources
                            .notifier()
                            .error(format!("Video generation failed: {}", message));
                        let _ = events.send(PollEvent::VideoFailed(project));
                        return;
                    }
                    ProjectStatus::Pending | ProjectStatus::Processing => {}
                }
            }
        });

        self.install(JobKind::Video, ActivePoll { cancel, _handle: handle });
    }

    /// Track an Instagram post until it stops needing automatic polling.
    /// Returns a ticket resolving like the original's promise: prompt
    /// ready, completed, and attempt-cap timeout all resolve `Ok`;
    /// `failed`/`error` resolves `Err` with the message.
    pub fn start_insta_poll(&self, post_id: i64) -> InstaTicket {
        self.stop(JobKind::Insta);
        info!(
            "📸 Polling Instagram post {} every {:?} (max {} attempts)",
            post_id, self.settings.insta_interval, self.settings.insta_max_attempts
        );

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let resources = self.resources.clone();
        let events = self.events.clone();
        let interval = self.settings.insta_interval;
        let max_attempts = self.settings.insta_max_attempts;
        let safety = self.settings.insta_safety_timeout;
        let (done_tx, done_rx) = oneshot::channel();

        let handle = tokio::spawn(async move {
            let run = Self::insta_loop(
                resources, events, token, post_id, interval, max_attempts, done_tx,
            );
            tokio::select! {
                _ = run => {}
                _ = tokio::time::sleep(safety) => {
                    warn!("Polling safety timeout for post {} after {:?}", post_id, safety);
                }
            }
        });

        self.install(JobKind::Insta, ActivePoll { cancel, _handle: handle });
        done_rx
    }

    async fn insta_loop(
        resources: Resources,
        events: mpsc::UnboundedSender<PollEvent>,
        token: CancellationToken,
        post_id: i64,
        interval: Duration,
        max_attempts: u32,
        done_tx: oneshot::Sender<Result<InstaPost, String>>,
    ) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        ticker.tick().await;

        let mut attempts: u32 = 0;
        loop {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = ticker.tick() => {}
            }

            // Failed fetches are skipped and do not advance the attempt
            // counter, so a flaky network cannot burn the budget.
            let Some(post) = resources.fetch_insta_post(post_id).await else {
                continue;
            };
            if token.is_cancelled() {
                return;
            }
            attempts += 1;

            match post.status {
                InstaStatus::PendingImage => {
                    resources
                        .notifier()
                        .success("Prompt generated! Click on the post to generate the image.");
                    let _ = events.send(PollEvent::InstaPromptReady(post.clone()));
                    let _ = done_tx.send(Ok(post));
                    return;
                }
                InstaStatus::Completed => {
                    resources
                        .notifier()
                        .success("Post and image generation completed!");
                    let _ = events.send(PollEvent::InstaCompleted(post.clone()));
                    let _ = done_tx.send(Ok(post));
                    return;
                }
                InstaStatus::Failed | InstaStatus::Error => {
                    let message = post
                        .error_message
                        .clone()
                        .unwrap_or_else(|| "Unknown error".to_string());
                    resources
                        .notifier()
                        .error(format!("Post generation failed: {}", message));
                    let _ = events.send(PollEvent::InstaFailed(post));
                    let _ = done_tx.send(Err(message));
                    return;
                }
                InstaStatus::Processing if attempts >= max_attempts => {
                    warn!("Polling stopped after {} attempts for post {}", attempts, post_id);
                    resources.notifier().warning(
                        "Polling stopped. Post generation taking longer than expected.",
                    );
                    let _ = events.send(PollEvent::InstaTimedOut(post.clone()));
                    let _ = done_tx.send(Ok(post));
                    return;
                }
                InstaStatus::Processing => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Backend;
    use crate::error::ApiError;
    use crate::models::{
        AuthCheck, CreateInstaPostResponse, CreateProjectResponse, DashboardStats,
        GeneratedImages, ImageRequest, NewInstaPost, NewProject, PostMode,
    };
    use crate::notify::Notifier;
    use async_trait::async_trait;
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::time::{timeout, Duration};

    fn project(id: i64, status: ProjectStatus, error: Option<&str>) -> Project {
        Project {
            id,
            title: format!("project {}", id),
            description: String::new(),
            status,
            created_at: "2026-08-01 10:00:00".to_string(),
            scene_1_img: None,
            scene_1_vid: None,
            scene_2_img: None,
            scene_2_vid: None,
            error_message: error.map(str::to_string),
        }
    }

    fn post(id: i64, status: InstaStatus) -> InstaPost {
        InstaPost {
            id,
            keyword: "cloud crm".to_string(),
            mode: PostMode::Marketing,
            status,
            title: None,
            subtitle: None,
            concept: None,
            address_line: None,
            primary_hex: None,
            secondary_hex: None,
            final_prompt: None,
            position: None,
            experience: None,
            location: None,
            generated_image_urls: None,
            error_message: None,
            created_at: "2026-08-01 10:00:00".to_string(),
            updated_at: None,
        }
    }

    /// Backend whose per-id responses are scripted. The last entry of a
    /// script repeats once the queue drains; `Err(())` entries simulate a
    /// transport failure for that tick.
    #[derive(Default)]
    struct Scripted {
        projects: Mutex<HashMap<i64, VecDeque<Result<Project, ()>>>>,
        posts: Mutex<HashMap<i64, VecDeque<Result<InstaPost, ()>>>>,
        post_fetches: AtomicUsize,
    }

    impl Scripted {
        fn script_project(&self, id: i64, steps: Vec<Result<Project, ()>>) {
            self.projects.lock().unwrap().insert(id, steps.into());
        }

        fn script_post(&self, id: i64, steps: Vec<Result<InstaPost, ()>>) {
            self.posts.lock().unwrap().insert(id, steps.into());
        }

        fn next<T: Clone>(map: &mut HashMap<i64, VecDeque<Result<T, ()>>>, id: i64) -> Result<T, ()> {
            let queue = map.get_mut(&id).expect("unscripted id");
            if queue.len() > 1 {
                queue.pop_front().unwrap()
            } else {
                queue.front().cloned().expect("empty script")
            }
        }
    }

    fn transport_err() -> ApiError {
        ApiError::Payload("scripted transport failure".to_string())
    }

    #[async_trait]
    impl Backend for Scripted {
        async fn check_auth(&self) -> Result<AuthCheck, ApiError> {
            Ok(AuthCheck { authenticated: true })
        }
        async fn logout(&self) -> Result<(), ApiError> {
            Ok(())
        }
        async fn list_projects(&self) -> Result<Vec<Project>, ApiError> {
            Ok(Vec::new())
        }
        async fn get_project(&self, id: i64) -> Result<Project, ApiError> {
            Scripted::next(&mut self.projects.lock().unwrap(), id).map_err(|_| transport_err())
        }
        async fn create_project(&self, _new: NewProject) -> Result<CreateProjectResponse, ApiError> {
            unimplemented!("not used by poller tests")
        }
        async fn delete_project(&self, _id: i64) -> Result<(), ApiError> {
            Ok(())
        }
        async fn stats(&self) -> Result<DashboardStats, ApiError> {
            Ok(DashboardStats::default())
        }
        async fn list_insta_posts(&self) -> Result<Vec<InstaPost>, ApiError> {
            Ok(Vec::new())
        }
        async fn get_insta_post(&self, id: i64) -> Result<InstaPost, ApiError> {
            self.post_fetches.fetch_add(1, Ordering::SeqCst);
            Scripted::next(&mut self.posts.lock().unwrap(), id).map_err(|_| transport_err())
        }
        async fn delete_insta_post(&self, _id: i64) -> Result<(), ApiError> {
            Ok(())
        }
        async fn generate_insta_post(
            &self,
            _new: NewInstaPost,
        ) -> Result<CreateInstaPostResponse, ApiError> {
            unimplemented!("not used by poller tests")
        }
        async fn generate_image(&self, _request: ImageRequest) -> Result<GeneratedImages, ApiError> {
            unimplemented!("not used by poller tests")
        }
        async fn save_images(&self, _post_id: i64, _urls: &[String]) -> Result<(), ApiError> {
            Ok(())
        }
    }

    fn settings() -> PollSettings {
        PollSettings {
            video_interval: Duration::from_millis(3000),
            insta_interval: Duration::from_millis(2000),
            insta_max_attempts: 45,
            insta_safety_timeout: Duration::from_millis(45 * 2000 + 5000),
        }
    }

    fn manager(
        backend: Arc<Scripted>,
        settings: PollSettings,
    ) -> (PollerManager, mpsc::UnboundedReceiver<PollEvent>) {
        let (notifier, _toasts) = Notifier::channel();
        let (resources, _session) = crate::resources::Resources::new(backend, notifier);
        PollerManager::new(resources, settings)
    }

    async fn next_event(rx: &mut mpsc::UnboundedReceiver<PollEvent>) -> PollEvent {
        timeout(Duration::from_secs(600), rx.recv())
            .await
            .expect("timed out waiting for poll event")
            .expect("event channel closed")
    }

    #[tokio::test(start_paused = true)]
    async fn video_poll_stops_at_completed_and_fires_completion_once() {
        let backend = Arc::new(Scripted::default());
        backend.script_project(
            7,
            vec![
                Ok(project(7, ProjectStatus::Pending, None)),
                Ok(project(7, ProjectStatus::Processing, None)),
                Ok(project(7, ProjectStatus::Completed, None)),
            ],
        );
        let (manager, mut events) = manager(backend, settings());

        manager.start_video_poll(7);

        match next_event(&mut events).await {
            PollEvent::VideoCompleted(p) => assert_eq!(p.id, 7),
            other => panic!("expected VideoCompleted, got {:?}", other),
        }
        // The task is done; no second completion or failure ever arrives.
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(events.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn video_poll_surfaces_failure_message_verbatim() {
        let backend = Arc::new(Scripted::default());
        backend.script_project(
            9,
            vec![
                Ok(project(9, ProjectStatus::Pending, None)),
                Ok(project(9, ProjectStatus::Failed, Some("scene render exploded"))),
            ],
        );
        let (manager, mut events) = manager(backend, settings());

        manager.start_video_poll(9);

        match next_event(&mut events).await {
            PollEvent::VideoFailed(p) => {
                assert_eq!(p.error_message.as_deref(), Some("scene render exploded"));
            }
            other => panic!("expected VideoFailed, got {:?}", other),
        }
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(events.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn starting_a_second_poll_cancels_the_first() {
        let backend = Arc::new(Scripted::default());
        // Project 1 would complete on its second tick, if it got one.
        backend.script_project(
            1,
            vec![
                Ok(project(1, ProjectStatus::Processing, None)),
                Ok(project(1, ProjectStatus::Completed, None)),
            ],
        );
        backend.script_project(
            2,
            vec![
                Ok(project(2, ProjectStatus::Processing, None)),
                Ok(project(2, ProjectStatus::Completed, None)),
            ],
        );
        let (manager, mut events) = manager(backend, settings());

        manager.start_video_poll(1);
        // Let exactly one tick of poll A land, then supersede it.
        tokio::time::sleep(Duration::from_millis(3500)).await;
        manager.start_video_poll(2);

        match next_event(&mut events).await {
            PollEvent::VideoCompleted(p) => assert_eq!(p.id, 2),
            other => panic!("expected completion from poll B, got {:?}", other),
        }
        // No stale side effects from poll A, ever.
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(events.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn insta_poll_quiesces_at_pending_image_without_completion() {
        let backend = Arc::new(Scripted::default());
        backend.script_post(
            20,
            vec![
                Ok(post(20, InstaStatus::Processing)),
                Ok(post(20, InstaStatus::Processing)),
                Ok(post(20, InstaStatus::PendingImage)),
            ],
        );
        let (manager, mut events) = manager(backend, settings());

        let ticket = manager.start_insta_poll(20);

        match next_event(&mut events).await {
            PollEvent::InstaPromptReady(p) => assert_eq!(p.status, InstaStatus::PendingImage),
            other => panic!("expected InstaPromptReady, got {:?}", other),
        }
        let resolved = ticket.await.unwrap().unwrap();
        assert_eq!(resolved.status, InstaStatus::PendingImage);
        // Prompt-ready must never look like full completion.
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(events.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn insta_poll_resolves_with_last_record_at_attempt_cap() {
        let backend = Arc::new(Scripted::default());
        backend.script_post(21, vec![Ok(post(21, InstaStatus::Processing))]);
        let mut s = settings();
        s.insta_max_attempts = 5;
        s.insta_safety_timeout = Duration::from_millis(5 * 2000 + 5000);
        let (manager, mut events) = manager(backend.clone(), s);

        let ticket = manager.start_insta_poll(21);

        match next_event(&mut events).await {
            PollEvent::InstaTimedOut(p) => assert_eq!(p.status, InstaStatus::Processing),
            other => panic!("expected InstaTimedOut, got {:?}", other),
        }
        // Resolves, not rejects, after exactly the attempt budget.
        let resolved = ticket.await.unwrap();
        assert!(resolved.is_ok());
        assert_eq!(backend.post_fetches.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn insta_poll_rejects_on_failed_status() {
        let backend = Arc::new(Scripted::default());
        let mut failed = post(22, InstaStatus::Failed);
        failed.error_message = Some("prompt model unavailable".to_string());
        backend.script_post(22, vec![Ok(post(22, InstaStatus::Processing)), Ok(failed)]);
        let (manager, mut events) = manager(backend, settings());

        let ticket = manager.start_insta_poll(22);

        match next_event(&mut events).await {
            PollEvent::InstaFailed(p) => assert_eq!(p.id, 22),
            other => panic!("expected InstaFailed, got {:?}", other),
        }
        assert_eq!(
            ticket.await.unwrap().unwrap_err(),
            "prompt model unavailable"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_failures_skip_ticks_without_burning_attempts() {
        let backend = Arc::new(Scripted::default());
        backend.script_post(
            23,
            vec![
                Err(()),
                Ok(post(23, InstaStatus::Processing)),
                Err(()),
                Ok(post(23, InstaStatus::PendingImage)),
            ],
        );
        let mut s = settings();
        // Two successful fetches fit exactly; failed ticks must not count.
        s.insta_max_attempts = 2;
        s.insta_safety_timeout = Duration::from_secs(120);
        let (manager, mut events) = manager(backend, s);

        let ticket = manager.start_insta_poll(23);

        match next_event(&mut events).await {
            PollEvent::InstaPromptReady(_) => {}
            other => panic!("expected InstaPromptReady, got {:?}", other),
        }
        assert!(ticket.await.unwrap().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_is_a_safe_noop_when_idle() {
        let backend = Arc::new(Scripted::default());
        let (manager, _events) = manager(backend, settings());
        manager.stop(JobKind::Video);
        manager.stop(JobKind::Insta);
    }
}
