//! 定时器和 alarm 测试

use super::mock::{bare, boot, Sched};
use crate::config::{HZ, TIME_REQUESTS};
use crate::signal::{SigType, Signal};

fn record(sched: &mut Sched, data: usize) {
    let jiffies = sched.jiffies();
    sched.platform_mut().fired.push((jiffies, data));
}

fn rearm(sched: &mut Sched, data: usize) {
    record(sched, data);
    if data < 3 {
        sched.add_timer(2, rearm, data + 1);
    }
}

#[test]
fn test_non_positive_delay_runs_immediately() {
    let mut sched = bare();
    sched.add_timer(0, record, 1);
    sched.add_timer(-3, record, 2);
    assert_eq!(sched.platform().fired, [(0, 1), (0, 2)]);
    assert!(sched.timers.is_empty());
}

#[test]
fn test_timers_fire_from_tick_in_order() {
    let mut sched = bare();
    sched.add_timer(3, record, 30);
    sched.add_timer(1, record, 10);
    sched.add_timer(3, record, 31);

    for _ in 0..4 {
        sched.do_timer(false);
    }
    assert_eq!(sched.platform().fired, [(1, 10), (3, 30), (3, 31)]);
    assert!(sched.timers.is_empty());
}

#[test]
fn test_callback_can_add_timer() {
    let mut sched = bare();
    sched.add_timer(2, rearm, 1);
    for _ in 0..8 {
        sched.do_timer(false);
    }
    assert_eq!(sched.platform().fired, [(2, 1), (4, 2), (6, 3)]);
}

#[test]
#[should_panic(expected = "No more time requests free")]
fn test_pool_exhaustion_is_fatal() {
    let mut sched = bare();
    for i in 0..=TIME_REQUESTS {
        sched.add_timer(10, record, i);
    }
}

#[test]
fn test_alarm_raises_sigalrm_on_schedule() {
    let mut sched = boot();
    assert_eq!(sched.sys_alarm(1), 0);
    assert_eq!(sched.current().alarm, HZ);

    for _ in 0..HZ {
        sched.do_timer(false);
    }
    // 到期时刻还没有被越过
    sched.schedule();
    assert!(!sched.current().signal.is_pending(Signal::SIGALRM as SigType));

    sched.do_timer(false);
    sched.schedule();
    assert!(sched.current().signal.is_pending(Signal::SIGALRM as SigType));
    assert_eq!(sched.current().alarm, 0);
}

#[test]
fn test_sys_alarm_returns_remaining_seconds() {
    let mut sched = boot();
    assert_eq!(sched.sys_alarm(5), 0);

    sched.jiffies = 150;
    assert_eq!(sched.sys_alarm(10), (5 * HZ - 150) / HZ);
    assert_eq!(sched.current().alarm, 150 + 10 * HZ);

    assert_eq!(sched.sys_alarm(0), 10);
    assert_eq!(sched.current().alarm, 0);
    assert_eq!(sched.sys_alarm(-1), 0);
}

#[test]
fn test_sys_alarm_after_deadline_passed() {
    let mut sched = boot();
    sched.sys_alarm(1);
    sched.jiffies = 3 * HZ;
    assert_eq!(sched.sys_alarm(0), 0);
}
