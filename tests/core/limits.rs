//! Limit resolution, cap checks, and the saturating memory tracker.

use deflater::limits::{
    DEFAULT_MAX_EXPANSION_RATIO, DEFAULT_MAX_MEMORY_BYTES, DEFAULT_MAX_OUTPUT_BYTES,
};
use deflater::{Limits, MemoryTracker, Options, Status};

#[test]
fn defaults_without_options() {
    let limits = Limits::from_options(&Options::new());
    assert_eq!(limits.max_output_bytes, DEFAULT_MAX_OUTPUT_BYTES);
    assert_eq!(limits.max_memory_bytes, DEFAULT_MAX_MEMORY_BYTES);
    assert_eq!(limits.max_window_bytes, 0);
    assert_eq!(limits.max_expansion_ratio, DEFAULT_MAX_EXPANSION_RATIO);
}

#[test]
fn options_override_defaults() {
    let mut options = Options::new();
    options.set_uint64("limits.max_output_bytes", 42);
    options.set_uint64("limits.max_memory_bytes", 43);
    options.set_uint64("limits.max_window_bytes", 44);
    options.set_uint64("limits.max_expansion_ratio", 45);
    let limits = Limits::from_options(&options);
    assert_eq!(limits.max_output_bytes, 42);
    assert_eq!(limits.max_memory_bytes, 43);
    assert_eq!(limits.max_window_bytes, 44);
    assert_eq!(limits.max_expansion_ratio, 45);
}

#[test]
fn zero_means_unlimited() {
    let mut options = Options::new();
    options.set_uint64("limits.max_output_bytes", 0);
    options.set_uint64("limits.max_expansion_ratio", 0);
    let limits = Limits::from_options(&options);
    assert!(limits.check_output(u64::MAX).is_ok());
    assert!(limits.check_expansion(1, u64::MAX).is_ok());
}

#[test]
fn output_cap_is_inclusive() {
    let mut options = Options::new();
    options.set_uint64("limits.max_output_bytes", 100);
    let limits = Limits::from_options(&options);
    assert!(limits.check_output(100).is_ok());
    let err = limits.check_output(101).unwrap_err();
    assert_eq!(err.status(), Status::Limit);
}

#[test]
fn expansion_needs_input_first() {
    let mut options = Options::new();
    options.set_uint64("limits.max_expansion_ratio", 2);
    let limits = Limits::from_options(&options);
    // No ratio can be computed before any input is consumed.
    assert!(limits.check_expansion(0, 1_000_000).is_ok());
    assert!(limits.check_expansion(10, 20).is_ok());
    assert_eq!(
        limits.check_expansion(10, 21).unwrap_err().status(),
        Status::Limit
    );
}

#[test]
fn memory_tracker_saturates() {
    let mut tracker = MemoryTracker::new();
    tracker.track_alloc(100);
    tracker.track_free(300);
    assert_eq!(tracker.current(), 0);

    tracker.track_alloc(usize::MAX);
    tracker.track_alloc(usize::MAX);
    assert_eq!(tracker.current(), usize::MAX);
}

#[test]
fn memory_tracker_checks_cap() {
    let mut tracker = MemoryTracker::new();
    tracker.track_alloc(512);
    assert!(tracker.check(512).is_ok());
    assert!(tracker.check(0).is_ok());
    assert_eq!(tracker.check(511).unwrap_err().status(), Status::Limit);
}
