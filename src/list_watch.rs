// src/list_watch.rs
//! Background watcher for the Instagram post list. While any post is
//! still `processing`, re-fetch the list on an interval and report a
//! change only when the `id:status:updated_at` signature differs from
//! the last tick. Once nothing is processing the watcher stops itself.

use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::models::{InstaPost, InstaStatus};
use crate::resources::Resources;

#[derive(Debug, Clone)]
pub enum ListEvent {
    /// The list differs from the previous tick; consumers re-render the
    /// post list and refresh dashboard stats.
    Changed(Vec<InstaPost>),
    /// No post is processing anymore; the watcher has stopped. Carries
    /// the final list so consumers can refresh once more.
    Settled(Vec<InstaPost>),
}

/// Compact fingerprint of list state. `updated_at` is included so an
/// in-place record update with an unchanged status still registers.
pub fn signature(posts: &[InstaPost]) -> String {
    posts
        .iter()
        .map(|p| {
            format!(
                "{}:{}:{}",
                p.id,
                p.status.as_str(),
                p.updated_at.as_deref().unwrap_or("")
            )
        })
        .collect::<Vec<_>>()
        .join("|")
}

struct ActiveWatch {
    cancel: CancellationToken,
    _handle: JoinHandle<()>,
}

pub struct ListWatcher {
    resources: Resources,
    interval: Duration,
    events: mpsc::UnboundedSender<ListEvent>,
    active: Mutex<Option<ActiveWatch>>,
}

impl ListWatcher {
    pub fn new(
        resources: Resources,
        interval: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<ListEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        (
            Self {
                resources,
                interval,
                events,
                active: Mutex::new(None),
            },
            events_rx,
        )
    }

    pub fn stop(&self) {
        if let Some(active) = self.active.lock().unwrap().take() {
            active.cancel.cancel();
            info!("Cancelled Instagram list watch");
        }
    }

    /// Begin watching. Replaces any previous watch; the first check runs
    /// immediately, then every `interval`.
    pub fn start(&self) {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let resources = self.resources.clone();
        let events = self.events.clone();
        let interval = self.interval;

        info!("👀 Watching Instagram post list every {:?}", interval);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            let mut last_signature = String::new();

            loop {
                tokio::select! {
                    _ = token.cancelled() => return,
                    _ = ticker.tick() => {}
                }

                let posts = resources.fetch_insta_posts().await;
                if token.is_cancelled() {
                    return;
                }

                let current = signature(&posts);
                let changed = current != last_signature;
                if changed {
                    debug!("Post list signature changed ({} posts)", posts.len());
                    last_signature = current;
                    let _ = events.send(ListEvent::Changed(posts.clone()));
                }

                let still_processing = posts
                    .iter()
                    .any(|p| p.status == InstaStatus::Processing);
                if !still_processing {
                    info!("No posts processing, stopping list watch");
                    let _ = events.send(ListEvent::Settled(posts));
                    return;
                }
            }
        });

        let mut slot = self.active.lock().unwrap();
        if let Some(previous) = slot.replace(ActiveWatch { cancel, _handle: handle }) {
            previous.cancel.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::*;
    use crate::api::Backend;
    use crate::error::ApiError;
    use crate::models::{
        AuthCheck, CreateInstaPostResponse, CreateProjectResponse, DashboardStats,
        GeneratedImages, ImageRequest, NewInstaPost, NewProject, PostMode, Project,
    };
    use crate::notify::Notifier;

    fn post(id: i64, status: InstaStatus, updated_at: &str) -> InstaPost {
        InstaPost {
            id,
            keyword: "coffee".into(),
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
            created_at: "2025-11-05T10:30:00".into(),
            updated_at: Some(updated_at.to_string()),
        }
    }

    #[derive(Default)]
    struct ListScript {
        lists: Mutex<VecDeque<Vec<InstaPost>>>,
        fetches: AtomicUsize,
    }

    fn unreachable_err() -> ApiError {
        ApiError::Payload("not scripted".into())
    }

    #[async_trait]
    impl Backend for ListScript {
        async fn check_auth(&self) -> Result<AuthCheck, ApiError> {
            Err(unreachable_err())
        }
        async fn logout(&self) -> Result<(), ApiError> {
            Err(unreachable_err())
        }
        async fn list_projects(&self) -> Result<Vec<Project>, ApiError> {
            Err(unreachable_err())
        }
        async fn get_project(&self, _id: i64) -> Result<Project, ApiError> {
            Err(unreachable_err())
        }
        async fn create_project(&self, _new: NewProject) -> Result<CreateProjectResponse, ApiError> {
            Err(unreachable_err())
        }
        async fn delete_project(&self, _id: i64) -> Result<(), ApiError> {
            Err(unreachable_err())
        }
        async fn stats(&self) -> Result<DashboardStats, ApiError> {
            Err(unreachable_err())
        }
        async fn list_insta_posts(&self) -> Result<Vec<InstaPost>, ApiError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let mut lists = self.lists.lock().unwrap();
            let next = if lists.len() > 1 {
                lists.pop_front()
            } else {
                lists.front().cloned()
            };
            next.ok_or_else(unreachable_err)
        }
        async fn get_insta_post(&self, _id: i64) -> Result<InstaPost, ApiError> {
            Err(unreachable_err())
        }
        async fn delete_insta_post(&self, _id: i64) -> Result<(), ApiError> {
            Err(unreachable_err())
        }
        async fn generate_insta_post(
            &self,
            _new: NewInstaPost,
        ) -> Result<CreateInstaPostResponse, ApiError> {
            Err(unreachable_err())
        }
        async fn generate_image(&self, _request: ImageRequest) -> Result<GeneratedImages, ApiError> {
            Err(unreachable_err())
        }
        async fn save_images(&self, _post_id: i64, _urls: &[String]) -> Result<(), ApiError> {
            Err(unreachable_err())
        }
    }

    fn watcher(script: Arc<ListScript>) -> (ListWatcher, mpsc::UnboundedReceiver<ListEvent>) {
        let (notifier, _toasts) = Notifier::channel();
        let (resources, _session) = Resources::new(script, notifier);
        ListWatcher::new(resources, Duration::from_millis(3000))
    }

    #[test]
    fn signature_tracks_id_status_and_updated_at() {
        let a = vec![post(1, InstaStatus::Processing, "t1")];
        let b = vec![post(1, InstaStatus::Processing, "t2")];
        let c = vec![post(1, InstaStatus::Completed, "t2")];
        assert_eq!(signature(&a), "1:processing:t1");
        assert_ne!(signature(&a), signature(&b));
        assert_ne!(signature(&b), signature(&c));
    }

    #[tokio::test(start_paused = true)]
    async fn emits_changed_only_on_signature_change() {
        let script = Arc::new(ListScript::default());
        script.lists.lock().unwrap().extend([
            vec![post(1, InstaStatus::Processing, "t1")],
            vec![post(1, InstaStatus::Processing, "t1")],
            vec![post(1, InstaStatus::PendingImage, "t2")],
        ]);
        let (watcher, mut events) = watcher(script);

        watcher.start();
        // First tick fires immediately, then one tick per interval. The
        // third tick sees no processing post and ends the watch.
        tokio::time::sleep(Duration::from_millis(6500)).await;

        let mut changed = 0;
        let mut settled = 0;
        while let Ok(event) = events.try_recv() {
            match event {
                ListEvent::Changed(_) => changed += 1,
                ListEvent::Settled(posts) => {
                    settled += 1;
                    assert_eq!(posts[0].status, InstaStatus::PendingImage);
                }
            }
        }
        // Initial list counts as a change from the empty signature; the
        // identical second tick must not.
        assert_eq!(changed, 2);
        assert_eq!(settled, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stops_fetching_once_nothing_is_processing() {
        let script = Arc::new(ListScript::default());
        script
            .lists
            .lock()
            .unwrap()
            .push_back(vec![post(1, InstaStatus::Completed, "t1")]);
        let (watcher, mut events) = watcher(Arc::clone(&script));

        watcher.start();
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(script.fetches.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(20_000)).await;
        assert_eq!(script.fetches.load(Ordering::SeqCst), 1);
        assert!(matches!(events.try_recv(), Ok(ListEvent::Changed(_))));
        assert!(matches!(events.try_recv(), Ok(ListEvent::Settled(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn restart_cancels_the_previous_watch() {
        let script = Arc::new(ListScript::default());
        script
            .lists
            .lock()
            .unwrap()
            .push_back(vec![post(1, InstaStatus::Processing, "t1")]);
        let (watcher, mut events) = watcher(Arc::clone(&script));

        watcher.start();
        tokio::time::sleep(Duration::from_millis(100)).await;
        watcher.start();
        tokio::time::sleep(Duration::from_millis(100)).await;
        watcher.stop();
        tokio::time::sleep(Duration::from_millis(20_000)).await;

        // Two immediate first ticks, then nothing after stop().
        assert_eq!(script.fetches.load(Ordering::SeqCst), 2);
        // Both watches saw the same non-empty list as their first change.
        assert!(matches!(events.try_recv(), Ok(ListEvent::Changed(_))));
        assert!(matches!(events.try_recv(), Ok(ListEvent::Changed(_))));
        assert!(events.try_recv().is_err());
    }
}
