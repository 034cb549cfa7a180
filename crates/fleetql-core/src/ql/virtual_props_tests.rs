//! Tests for virtual property expansion.

use super::*;
use crate::config::OverdueConfig;

fn resolver() -> VirtualPropertyResolver {
    VirtualPropertyResolver::new(&OverdueConfig {
        polling_interval_secs: 60,
        overdue_interval_secs: 30,
    })
    .with_fixed_now(10_000_000)
}

#[test]
fn test_now_ts_is_expanded() {
    assert_eq!(resolver().resolve("${NOW_TS}"), "10000000");
}

#[test]
fn test_overdue_ts_subtracts_both_intervals() {
    // Arrange
    let r = resolver();

    // Act
    let value = r.resolve("${OVERDUE_TS}");

    // Assert - 90 seconds before now
    assert_eq!(value, "9910000");
    assert_eq!(r.overdue_ts(), 9_910_000);
}

#[test]
fn test_macro_names_are_case_insensitive() {
    assert_eq!(resolver().resolve("${now_ts}"), "10000000");
}

#[test]
fn test_double_dollar_escapes_expansion() {
    assert_eq!(resolver().resolve("$${NOW_TS}"), "${NOW_TS}");
}

#[test]
fn test_unknown_macro_is_left_untouched() {
    assert_eq!(resolver().resolve("${UNKNOWN}"), "${UNKNOWN}");
}

#[test]
fn test_macro_inside_text() {
    assert_eq!(
        resolver().resolve("before-${NOW_TS}-after"),
        "before-10000000-after"
    );
}

#[test]
fn test_plain_dollar_and_unterminated_macro() {
    assert_eq!(resolver().resolve("price$5"), "price$5");
    assert_eq!(resolver().resolve("${NOW_TS"), "${NOW_TS");
}

#[test]
fn test_system_clock_is_positive() {
    let r = VirtualPropertyResolver::default();

    assert!(r.now_ts() > 0);
    assert!(r.overdue_ts() < r.now_ts());
}
