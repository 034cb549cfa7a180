//! Expansion of `${NAME}` macros inside filter values.
//!
//! Known macros:
//!
//! - `${NOW_TS}`: current time in epoch milliseconds
//! - `${OVERDUE_TS}`: `now - (polling interval + overdue interval)`
//!
//! `$${NAME}` yields the literal text `${NAME}`. Unknown macros are kept as-is.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::config::OverdueConfig;

const NOW_TS: &str = "NOW_TS";
const OVERDUE_TS: &str = "OVERDUE_TS";

/// Resolves virtual properties against a clock and the overdue settings.
#[derive(Debug, Clone, Copy)]
pub struct VirtualPropertyResolver {
    overdue_window: Duration,
    fixed_now: Option<i64>,
}

impl VirtualPropertyResolver {
    /// Creates a resolver reading the system clock.
    #[must_use]
    pub fn new(config: &OverdueConfig) -> Self {
        Self {
            overdue_window: Duration::from_secs(
                config
                    .polling_interval_secs
                    .saturating_add(config.overdue_interval_secs),
            ),
            fixed_now: None,
        }
    }

    /// Pins the clock to `now_millis`.
    #[must_use]
    pub fn with_fixed_now(mut self, now_millis: i64) -> Self {
        self.fixed_now = Some(now_millis);
        self
    }

    /// Current time in epoch milliseconds.
    #[must_use]
    pub fn now_ts(&self) -> i64 {
        self.fixed_now.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_or(0, |d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        })
    }

    /// Point in time before which a silent controller counts as overdue.
    #[must_use]
    pub fn overdue_ts(&self) -> i64 {
        let window = i64::try_from(self.overdue_window.as_millis()).unwrap_or(i64::MAX);
        self.now_ts().saturating_sub(window)
    }

    fn lookup(&self, name: &str) -> Option<i64> {
        if name.eq_ignore_ascii_case(NOW_TS) {
            Some(self.now_ts())
        } else if name.eq_ignore_ascii_case(OVERDUE_TS) {
            Some(self.overdue_ts())
        } else {
            None
        }
    }

    /// Expands every macro in `raw`.
    #[must_use]
    pub fn resolve(&self, raw: &str) -> String {
        if !raw.contains("${") {
            return raw.to_string();
        }

        let mut out = String::with_capacity(raw.len());
        let mut rest = raw;
        while let Some(start) = rest.find('$') {
            out.push_str(&rest[..start]);
            let tail = &rest[start..];

            if let Some(escaped) = tail.strip_prefix("$${") {
                out.push_str("${");
                rest = escaped;
                continue;
            }

            let expanded = tail.strip_prefix("${").and_then(|body| {
                let end = body.find('}')?;
                let value = self.lookup(&body[..end])?;
                Some((value, &body[end + 1..]))
            });

            match expanded {
                Some((value, remainder)) => {
                    out.push_str(&value.to_string());
                    rest = remainder;
                }
                None => {
                    out.push('$');
                    rest = &tail[1..];
                }
            }
        }
        out.push_str(rest);
        out
    }
}

impl Default for VirtualPropertyResolver {
    fn default() -> Self {
        Self::new(&OverdueConfig::default())
    }
}
