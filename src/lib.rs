// lib.rs - Main library file that exports all modules
pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod list_watch;
pub mod models;
pub mod notify;
pub mod poller;
pub mod progress;
pub mod render;
pub mod resources;
pub mod router;

// Re-export the surface a front end needs to drive the dashboard
pub use api::{Backend, HttpBackend, SharedBackend};
pub use app::{Channels, CreatePanel, Dashboard, PendingDeletion, Screen};
pub use config::Config;
pub use error::ApiError;
pub use list_watch::{ListEvent, ListWatcher};
pub use notify::{Level, Notification, Notifier};
pub use poller::{InstaTicket, JobKind, PollEvent, PollerManager};
pub use progress::{ProgressFrame, ProgressSimulator};
pub use resources::{Resources, SessionEvent};
pub use router::{Router, View, ViewLoader};
