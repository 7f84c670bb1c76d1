//! Environment-derived configuration.
//!
//! Values are read at the moment of use, never cached, so tests can perturb
//! the environment freely between events.

use std::env;
use std::time::Duration;

/// Credential for outbound Slack API calls.
pub const BOT_TOKEN: &str = "BOT_TOKEN";

/// The bot's user id as it appears in mention syntax (`<@Uxxxx>`).
pub const BOT_USER_ID: &str = "BOT_USER_ID";

/// Debounce quiet window in seconds for the event coalescer.
pub const COOLDOWN_SECONDS: &str = "COOLDOWN_SECONDS";

const SLACK_API_BASE: &str = "ANTKEEPER_SLACK_API_BASE";
const DEFAULT_SLACK_API_BASE: &str = "https://slack.com/api";
const DEFAULT_COOLDOWN_SECONDS: f64 = 30.0;

pub fn bot_token() -> String {
    env::var(BOT_TOKEN).unwrap_or_default()
}

pub fn bot_user_id() -> String {
    env::var(BOT_USER_ID).unwrap_or_default()
}

/// The coalescer cooldown. Fractional values are accepted so tests can run
/// with sub-second windows.
pub fn cooldown() -> Duration {
    let seconds = env::var(COOLDOWN_SECONDS)
        .ok()
        .and_then(|value| value.parse::<f64>().ok())
        .filter(|seconds| seconds.is_finite() && *seconds >= 0.0)
        .unwrap_or(DEFAULT_COOLDOWN_SECONDS);
    Duration::from_secs_f64(seconds)
}

/// Base URL for the Slack Web API, overridable for tests.
pub fn slack_api_base() -> String {
    env::var(SLACK_API_BASE)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_SLACK_API_BASE.to_string())
}

/// Names of the required Slack variables that are currently unset or empty.
pub fn missing_slack_vars() -> Vec<&'static str> {
    [BOT_TOKEN, BOT_USER_ID]
        .into_iter()
        .filter(|name| env::var(name).unwrap_or_default().is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn cooldown_defaults_to_thirty_seconds() {
        unsafe { env::remove_var(COOLDOWN_SECONDS) };
        assert_eq!(cooldown(), Duration::from_secs(30));
    }

    #[test]
    #[serial]
    fn cooldown_accepts_fractional_seconds() {
        unsafe { env::set_var(COOLDOWN_SECONDS, "0.25") };
        assert_eq!(cooldown(), Duration::from_millis(250));
        unsafe { env::remove_var(COOLDOWN_SECONDS) };
    }

    #[test]
    #[serial]
    fn cooldown_ignores_garbage() {
        unsafe { env::set_var(COOLDOWN_SECONDS, "soon") };
        assert_eq!(cooldown(), Duration::from_secs(30));
        unsafe { env::remove_var(COOLDOWN_SECONDS) };
    }

    #[test]
    #[serial]
    fn missing_slack_vars_lists_unset_names() {
        unsafe {
            env::remove_var(BOT_TOKEN);
            env::remove_var(BOT_USER_ID);
        }
        assert_eq!(missing_slack_vars(), vec![BOT_TOKEN, BOT_USER_ID]);

        unsafe { env::set_var(BOT_TOKEN, "xoxb-test") };
        assert_eq!(missing_slack_vars(), vec![BOT_USER_ID]);

        unsafe { env::set_var(BOT_USER_ID, "U_BOT") };
        assert!(missing_slack_vars().is_empty());

        unsafe {
            env::remove_var(BOT_TOKEN);
            env::remove_var(BOT_USER_ID);
        }
    }
}
