// src/router.rs
//! Single-page navigation: exactly one named view is active at a time,
//! the URL fragment mirrors it for bookmarking, and every activation runs
//! that view's data load. Back/forward restore from the typed history
//! payload, not from re-parsing the URL, so the composite detail view
//! restores exactly like forward navigation.

use async_trait::async_trait;
use tracing::debug;

/// The navigable sections of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Dashboard,
    Projects,
    Create,
    InstaPosts,
    CreateInstaPost,
    ViewProject,
    /// Detail view for one Instagram post, addressable by id.
    ViewInstaPost(i64),
}

impl View {
    /// URL fragment slug. The default view keeps an empty slug.
    pub fn slug(&self) -> String {
        match self {
            View::Dashboard => String::new(),
            View::Projects => "projects".to_string(),
            View::Create => "create".to_string(),
            View::InstaPosts => "instaPost".to_string(),
            View::CreateInstaPost => "createInstaPost".to_string(),
            View::ViewProject => "viewProject".to_string(),
            View::ViewInstaPost(id) => format!("viewInstaPost/{}", id),
        }
    }

    /// Parse a URL fragment (without the leading `#`).
    pub fn parse_fragment(fragment: &str) -> Option<View> {
        if let Some(rest) = fragment.strip_prefix("viewInstaPost/") {
            return rest.parse::<i64>().ok().map(View::ViewInstaPost);
        }
        match fragment {
            "" => Some(View::Dashboard),
            "dashboard" => Some(View::Dashboard),
            "projects" => Some(View::Projects),
            "create" => Some(View::Create),
            "instaPost" => Some(View::InstaPosts),
            "createInstaPost" => Some(View::CreateInstaPost),
            "viewProject" => Some(View::ViewProject),
            _ => None,
        }
    }
}

/// Per-view data loads, run on every activation (forward or restored).
#[async_trait]
pub trait ViewLoader: Send + Sync {
    /// Summary stats plus the recent-projects strip.
    async fn load_dashboard(&self);
    /// Full paginated project list.
    async fn load_projects(&self);
    /// Reset the video submission form to its blank state.
    async fn reset_create_form(&self);
    /// Instagram post list.
    async fn load_insta_posts(&self);
    /// Reset the Instagram post form, including its mode toggle.
    async fn reset_insta_form(&self);
    /// Fetch and render one post's detail view.
    async fn load_insta_post_detail(&self, id: i64);
}

/// One history entry: the typed state payload plus the slug it showed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub view: View,
    pub slug: String,
}

impl HistoryEntry {
    fn new(view: View) -> Self {
        Self {
            slug: view.slug(),
            view,
        }
    }
}

pub struct Router<L> {
    loader: L,
    current: View,
    entries: Vec<HistoryEntry>,
    index: usize,
}

impl<L: ViewLoader> Router<L> {
    /// A fresh router sits on the default view with a single base history
    /// entry, mirroring the page the browser landed on.
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            current: View::Dashboard,
            entries: vec![HistoryEntry::new(View::Dashboard)],
            index: 0,
        }
    }

    pub fn current(&self) -> View {
        self.current
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Fragment the address bar should show right now.
    pub fn fragment(&self) -> String {
        let slug = self.current.slug();
        if slug.is_empty() {
            "#".to_string()
        } else {
            format!("#{}", slug)
        }
    }

    fn push(&mut self, view: View) {
        // A push discards any forward entries, like browser history.
        self.entries.truncate(self.index + 1);
        self.entries.push(HistoryEntry::new(view));
        self.index = self.entries.len() - 1;
    }

    async fn dispatch_load(&self, view: View) {
        match view {
            View::Dashboard => self.loader.load_dashboard().await,
            View::Projects => self.loader.load_projects().await,
            View::Create => self.loader.reset_create_form().await,
            View::InstaPosts => self.loader.load_insta_posts().await,
            View::CreateInstaPost => self.loader.reset_insta_form().await,
            View::ViewInstaPost(id) => self.loader.load_insta_post_detail(id).await,
            // The project detail view is rendered by its caller before
            // navigation; activation alone is enough.
            View::ViewProject => {}
        }
    }

    /// Deactivate everything, activate `view`, push one history entry,
    /// and run the view's load callback.
    pub async fn switch_view(&mut self, view: View) {
        debug!("Switching view to {:?}", view);
        self.current = view;
        self.push(view);
        self.dispatch_load(view).await;
    }

    /// Navigate to one post's detail view. This path manages its own
    /// history push: loading it from the URL on page load passes
    /// `update_history = false` so the entry is not registered twice.
    pub async fn view_insta_post(&mut self, post_id: i64, update_history: bool) {
        let view = View::ViewInstaPost(post_id);
        if update_history {
            self.push(view);
        }
        self.current = view;
        self.dispatch_load(view).await;
    }

    /// Initial navigation from the URL fragment. Absent or unparsable
    /// fragments fall through to the default view.
    pub async fn handle_initial_fragment(&mut self, fragment: Option<&str>) {
        match fragment.and_then(View::parse_fragment) {
            Some(View::ViewInstaPost(id)) => self.view_insta_post(id, false).await,
            Some(view) => self.switch_view(view).await,
            None => {
                self.current = View::Dashboard;
                self.dispatch_load(View::Dashboard).await;
            }
        }
    }

    /// Browser back. Restores the previous entry's view from its state
    /// payload and reruns the same load as forward navigation.
    pub async fn back(&mut self) -> Option<View> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        let view = self.entries[self.index].view;
        debug!("History back to {:?}", view);
        self.current = view;
        self.dispatch_load(view).await;
        Some(view)
    }

    /// Browser forward.
    pub async fn forward(&mut self) -> Option<View> {
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        let view = self.entries[self.index].view;
        debug!("History forward to {:?}", view);
        self.current = view;
        self.dispatch_load(view).await;
        Some(view)
    }
}
