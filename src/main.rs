// src/main.rs
//! Headless driver for the dashboard engine: connects to the CRM backend,
//! runs the page-load flow, then logs every toast, progress frame, and
//! poll transition until Ctrl-C. The library is the product; this binary
//! exists for manual runs against a live backend.

use std::sync::Arc;

use studio_dashboard::{
    Channels, Config, Dashboard, HttpBackend, ListEvent, Notification, PollEvent, SessionEvent,
};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    init_logging().expect("Failed to initialize logging");

    let config = Config::from_env();
    tracing::info!("🚀 Studio dashboard starting against {}", config.api_base);

    let backend = match HttpBackend::new(config.api_base.clone()) {
        Ok(backend) => Arc::new(backend),
        Err(e) => {
            tracing::error!("Failed to build HTTP client: {}", e);
            std::process::exit(1);
        }
    };

    let (mut dashboard, channels) = Dashboard::new(backend, &config);

    let fragment = std::env::args().nth(1);
    if !dashboard.startup(fragment.as_deref()).await {
        tracing::error!("Session invalid, login required at {}", config.login_url);
        std::process::exit(1);
    }
    tracing::info!("✅ Startup complete, current view: {:?}", dashboard.current_view());

    run_event_loop(&mut dashboard, channels, &config).await;

    dashboard.shutdown().await;
    tracing::info!("👋 Dashboard stopped");
}

async fn run_event_loop(dashboard: &mut Dashboard, mut channels: Channels, config: &Config) {
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl-C received, shutting down");
                return;
            }
            Some(Notification { level, message, .. }) = channels.toasts.recv() => {
                tracing::info!("Toast [{:?}] {}", level, message);
            }
            Some(SessionEvent::LoginRequired) = channels.session.recv() => {
                tracing::error!("Session expired, login required at {}", config.login_url);
                return;
            }
            Some(event) = channels.poll_events.recv() => {
                log_poll_event(&event);
                dashboard.handle_poll_event(event).await;
            }
            Some(event) = channels.list_events.recv() => {
                dashboard.handle_list_event(event.clone()).await;
                if let ListEvent::Settled(posts) = event {
                    tracing::info!("Post list settled with {} posts", posts.len());
                }
            }
            changed = channels.progress.changed() => {
                if changed.is_err() {
                    continue;
                }
                let frame = channels.progress.borrow_and_update().clone();
                tracing::debug!(
                    "Progress {}% - {} ({})",
                    frame.percent, frame.label, frame.eta
                );
            }
        }
    }
}

fn log_poll_event(event: &PollEvent) {
    match event {
        PollEvent::VideoCompleted(project) => {
            tracing::info!("🎉 Project {} completed", project.id);
        }
        PollEvent::VideoFailed(project) => {
            tracing::error!(
                "Project {} failed: {}",
                project.id,
                project.error_message.as_deref().unwrap_or("Unknown error")
            );
        }
        PollEvent::InstaPromptReady(post) => {
            tracing::info!("📝 Post {} prompt ready", post.id);
        }
        PollEvent::InstaCompleted(post) => {
            tracing::info!("📸 Post {} completed", post.id);
        }
        PollEvent::InstaFailed(post) => {
            tracing::error!(
                "Post {} failed: {}",
                post.id,
                post.error_message.as_deref().unwrap_or("Unknown error")
            );
        }
        PollEvent::InstaTimedOut(post) => {
            tracing::warn!("Post {} still processing after the attempt cap", post.id);
        }
    }
}

fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, fmt, Layer};

    // Get log level from environment or default to INFO for production
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            "debug,studio_dashboard=trace,reqwest=info,hyper=info".to_string()
        } else {
            "info,studio_dashboard=info,reqwest=warn,hyper=warn".to_string()
        }
    });

    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&log_level))?;

    let fmt_layer = if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        // JSON logging for production (easier for log aggregation)
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .boxed()
    } else {
        // Human-readable logging for development
        fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    Ok(())
}
