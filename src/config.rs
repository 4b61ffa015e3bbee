//! Startup settings merged from the command line, the environment and tmux
//! user options.

use anyhow::{bail, Context, Result};
use std::time::Duration;

pub const DEFAULT_REFRESH_RATE: f64 = 2.0;

/// tmux user options (without the leading `@`)
pub const REFRESH_RATE_OPTION: &str = "tmux_resource_monitor_refresh_rate";
pub const WINDOW_FILTER_OPTION: &str = "tmux_resource_monitor_window_filter";

/// Environment variable naming the session when no positional is given
pub const SESSION_ENV: &str = "TMUX_SESSION_NAME";

/// Raw inputs, one field per place a setting can come from
#[derive(Debug, Default, Clone)]
pub struct Sources {
    pub session_arg: Option<String>,
    pub session_env: Option<String>,
    pub current_session: Option<String>,
    pub window_arg: Option<String>,
    pub window_option: Option<String>,
    pub refresh_arg: Option<f64>,
    pub refresh_option: Option<String>,
    pub overview: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// None starts in the overview
    pub session: Option<String>,
    pub window_filter: Option<String>,
    pub refresh_interval: Duration,
}

impl Settings {
    pub fn resolve(sources: Sources) -> Result<Self> {
        let refresh_rate =
            resolve_refresh_rate(sources.refresh_arg, sources.refresh_option.as_deref())?;
        let refresh_interval = Duration::try_from_secs_f64(refresh_rate)
            .with_context(|| format!("Refresh rate {} is out of range", refresh_rate))?;

        let session = if sources.overview {
            None
        } else {
            non_empty(sources.session_arg)
                .or_else(|| non_empty(sources.session_env))
                .or_else(|| non_empty(sources.current_session))
        };

        // The sticky tmux option wins over the window passed on the command line
        let window_filter =
            non_empty(sources.window_option).or_else(|| non_empty(sources.window_arg));

        Ok(Self {
            session,
            window_filter,
            refresh_interval,
        })
    }
}

/// `--refresh-rate` beats the tmux option, which beats the default. An
/// unparsable option falls back to the default; a non-positive rate is an error.
pub fn resolve_refresh_rate(arg: Option<f64>, option: Option<&str>) -> Result<f64> {
    let rate = match arg {
        Some(rate) => rate,
        None => option
            .and_then(|value| value.trim().parse::<f64>().ok())
            .unwrap_or(DEFAULT_REFRESH_RATE),
    };
    if !(rate.is_finite() && rate > 0.0) {
        bail!("Refresh rate must be positive (got {})", rate);
    }
    Ok(rate)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    mod refresh_rate {
        use super::*;

        #[test]
        fn test_default_when_nothing_set() {
            assert_eq!(resolve_refresh_rate(None, None).unwrap(), 2.0);
        }

        #[test]
        fn test_cli_beats_option() {
            assert_eq!(resolve_refresh_rate(Some(0.5), Some("5")).unwrap(), 0.5);
        }

        #[test]
        fn test_option_used_without_cli() {
            assert_eq!(resolve_refresh_rate(None, Some(" 1.5 ")).unwrap(), 1.5);
        }

        #[test]
        fn test_garbage_option_falls_back_to_default() {
            assert_eq!(resolve_refresh_rate(None, Some("fast")).unwrap(), 2.0);
        }

        #[test]
        fn test_zero_and_negative_rejected() {
            assert!(resolve_refresh_rate(Some(0.0), None).is_err());
            assert!(resolve_refresh_rate(Some(-1.0), None).is_err());
            assert!(resolve_refresh_rate(None, Some("-3")).is_err());
        }

        #[test]
        fn test_nan_rejected() {
            assert!(resolve_refresh_rate(Some(f64::NAN), None).is_err());
        }
    }

    mod settings {
        use super::*;

        #[test]
        fn test_session_precedence() {
            let sources = Sources {
                session_arg: Some("cli".into()),
                session_env: Some("env".into()),
                current_session: Some("attached".into()),
                ..Default::default()
            };
            assert_eq!(Settings::resolve(sources).unwrap().session.as_deref(), Some("cli"));

            let sources = Sources {
                session_env: Some("env".into()),
                current_session: Some("attached".into()),
                ..Default::default()
            };
            assert_eq!(Settings::resolve(sources).unwrap().session.as_deref(), Some("env"));

            let sources = Sources {
                session_env: Some(String::new()),
                current_session: Some("attached".into()),
                ..Default::default()
            };
            assert_eq!(
                Settings::resolve(sources).unwrap().session.as_deref(),
                Some("attached")
            );
        }

        #[test]
        fn test_overview_flag_drops_session() {
            let sources = Sources {
                session_arg: Some("cli".into()),
                overview: true,
                ..Default::default()
            };
            assert_eq!(Settings::resolve(sources).unwrap().session, None);
        }

        #[test]
        fn test_window_option_is_sticky() {
            let sources = Sources {
                window_arg: Some("editor".into()),
                window_option: Some("logs".into()),
                ..Default::default()
            };
            assert_eq!(
                Settings::resolve(sources).unwrap().window_filter.as_deref(),
                Some("logs")
            );
        }

        #[test]
        fn test_window_arg_without_option() {
            let sources = Sources {
                window_arg: Some("editor".into()),
                ..Default::default()
            };
            assert_eq!(
                Settings::resolve(sources).unwrap().window_filter.as_deref(),
                Some("editor")
            );
        }

        #[test]
        fn test_refresh_interval_duration() {
            let sources = Sources {
                refresh_arg: Some(0.25),
                ..Default::default()
            };
            assert_eq!(
                Settings::resolve(sources).unwrap().refresh_interval,
                Duration::from_millis(250)
            );
        }

        #[test]
        fn test_bad_rate_fails_resolution() {
            let sources = Sources {
                refresh_arg: Some(0.0),
                ..Default::default()
            };
            assert!(Settings::resolve(sources).is_err());
        }
    }
}
