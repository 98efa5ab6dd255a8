// src/config.rs
use std::time::Duration;

/// Runtime configuration, resolved from environment variables with the
/// defaults the dashboard shipped with.
#[derive(Debug, Clone)]
pub struct Config {
    /// API root, e.g. `http://localhost:5000/api`. No trailing slash.
    pub api_base: String,
    /// Where to send the user when the session is gone.
    pub login_url: String,
    /// Interval between video project status checks.
    pub video_poll_interval: Duration,
    /// Interval between Instagram post status checks.
    pub insta_poll_interval: Duration,
    /// Attempt cap for Instagram post polling.
    pub insta_max_attempts: u32,
    /// Interval for the insta list watcher while posts are processing.
    pub list_watch_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:5000/api".to_string(),
            login_url: "/login.html".to_string(),
            video_poll_interval: Duration::from_millis(3000),
            insta_poll_interval: Duration::from_millis(2000),
            insta_max_attempts: 45,
            list_watch_interval: Duration::from_millis(3000),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_base: std::env::var("STUDIO_API_BASE")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base),
            login_url: std::env::var("STUDIO_LOGIN_URL").unwrap_or(defaults.login_url),
            video_poll_interval: env_millis("STUDIO_VIDEO_POLL_MS", defaults.video_poll_interval),
            insta_poll_interval: env_millis("STUDIO_INSTA_POLL_MS", defaults.insta_poll_interval),
            insta_max_attempts: std::env::var("STUDIO_INSTA_MAX_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&n| n > 0)
                .unwrap_or(defaults.insta_max_attempts),
            list_watch_interval: env_millis("STUDIO_LIST_WATCH_MS", defaults.list_watch_interval),
        }
    }

    /// Absolute wall-clock bound on one insta polling run: the attempt
    /// budget at the configured interval plus a 5 second grace.
    pub fn insta_safety_timeout(&self) -> Duration {
        self.insta_poll_interval * self.insta_max_attempts + Duration::from_millis(5000)
    }
}

fn env_millis(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|&ms| ms > 0)
        .map(Duration::from_millis)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_shipped_timings() {
        let c = Config::default();
        assert_eq!(c.video_poll_interval, Duration::from_millis(3000));
        assert_eq!(c.insta_poll_interval, Duration::from_millis(2000));
        assert_eq!(c.insta_max_attempts, 45);
    }

    #[test]
    fn safety_timeout_is_budget_plus_grace() {
        let c = Config::default();
        assert_eq!(
            c.insta_safety_timeout(),
            Duration::from_millis(45 * 2000 + 5000)
        );
    }
}
