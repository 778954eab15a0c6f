// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn system_clock_does_not_go_backwards() {
    let clock = SystemClock;
    let t1 = clock.now();
    std::thread::sleep(Duration::from_millis(1));
    let t2 = clock.now();
    assert!(t2 >= t1);
}

#[test]
fn fake_clock_can_be_advanced() {
    let clock = FakeClock::new();
    let t1 = clock.now();
    clock.advance(Duration::from_secs(60));
    let t2 = clock.now();
    assert_eq!((t2 - t1).num_seconds(), 60);
}

#[test]
fn fake_clock_is_cloneable_and_shared() {
    let clock1 = FakeClock::new();
    let clock2 = clock1.clone();
    let t1 = clock1.now();
    clock2.advance(Duration::from_secs(30));
    let t2 = clock1.now();
    assert_eq!((t2 - t1).num_seconds(), 30);
}

#[test]
fn fake_clock_does_not_move_on_its_own() {
    let clock = FakeClock::new();
    let t1 = clock.now();
    std::thread::sleep(Duration::from_millis(2));
    assert_eq!(clock.now(), t1);
}

#[test]
fn deadline_saturates_instead_of_overflowing() {
    let now = Utc::now();
    assert_eq!(deadline(now, Duration::MAX), DateTime::<Utc>::MAX_UTC);
    assert_eq!((deadline(now, Duration::from_secs(10)) - now).num_seconds(), 10);
}
