//! waitpid() 测试
//!
//! 测试进程等待和僵尸回收

use super::mock::{bare, boot, run_as, spawn};
use crate::errno::Errno;
use crate::process::exit::{Wait, WaitOptions, STOPPED_STATUS};
use crate::process::task::TaskState;
use crate::signal::{SigType, Signal};

#[test]
fn test_wait_without_children() {
    let mut sched = boot();
    assert_eq!(
        sched.sys_waitpid(-1, None, WaitOptions::empty()),
        Err(Errno::NoChild)
    );
    assert_eq!(
        sched.sys_waitpid(-1, None, WaitOptions::WNOHANG),
        Err(Errno::NoChild)
    );
}

#[test]
fn test_wnohang_with_live_child() {
    let mut sched = boot();
    spawn(&mut sched);

    assert_eq!(
        sched.sys_waitpid(-1, Some(0x100), WaitOptions::WNOHANG),
        Ok(Wait::NoHang)
    );
    assert_eq!(sched.current_slot(), 1);
    assert_eq!(sched.current().state, TaskState::Running);
    assert!(sched.platform().user_mem.is_empty());
}

#[test]
fn test_reap_zombie_exactly_once() {
    let mut sched = boot();
    let (pid, slot) = spawn(&mut sched);
    let stack = sched.task(slot).unwrap().kernel_stack.unwrap();

    run_as(&mut sched, pid);
    {
        let child = sched.current_mut();
        child.times.utime = 7;
        child.times.stime = 3;
    }
    sched.sys_exit(3);
    assert_eq!(sched.task(slot).unwrap().state, TaskState::Zombie);
    assert_eq!(sched.current_slot(), 1);
    assert!(sched.current().signal.is_pending(Signal::SIGCHLD as SigType));

    assert_eq!(
        sched.sys_waitpid(pid, Some(0x200), WaitOptions::empty()),
        Ok(Wait::Child(pid))
    );
    assert_eq!(sched.platform().user_mem.get(&(1, 0x200)), Some(&0x300));
    assert_eq!(sched.current().times.cutime, 7);
    assert_eq!(sched.current().times.cstime, 3);
    assert!(sched.task(slot).is_none());
    assert!(sched.platform().freed.contains(&stack));

    assert_eq!(
        sched.sys_waitpid(pid, Some(0x200), WaitOptions::WNOHANG),
        Err(Errno::NoChild)
    );
}

#[test]
fn test_stopped_child_reported_with_wuntraced() {
    let mut sched = boot();
    let (pid, slot) = spawn(&mut sched);
    sched.task_mut(slot).unwrap().state = TaskState::Stopped;

    // 不要求报告停止的子进程时跳过它
    assert_eq!(
        sched.sys_waitpid(-1, Some(0x40), WaitOptions::WNOHANG),
        Err(Errno::NoChild)
    );

    assert_eq!(
        sched.sys_waitpid(-1, Some(0x40), WaitOptions::WUNTRACED),
        Ok(Wait::Child(pid))
    );
    assert_eq!(sched.platform().user_mem.get(&(1, 0x40)), Some(&STOPPED_STATUS));
    assert!(sched.task(slot).is_some());
}

#[test]
fn test_process_group_selectors() {
    let mut sched = boot();
    sched.current_mut().pgrp = 1;
    let (_, same_group) = spawn(&mut sched);
    let (other, other_slot) = spawn(&mut sched);
    {
        let t = sched.task_mut(other_slot).unwrap();
        t.pgrp = 5;
        t.state = TaskState::Zombie;
        t.exit_code = 9;
    }
    assert_eq!(sched.task(same_group).unwrap().pgrp, 1);

    assert_eq!(
        sched.sys_waitpid(0, None, WaitOptions::WNOHANG),
        Ok(Wait::NoHang)
    );
    assert_eq!(
        sched.sys_waitpid(-6, None, WaitOptions::WNOHANG),
        Err(Errno::NoChild)
    );
    assert_eq!(
        sched.sys_waitpid(-5, Some(0x80), WaitOptions::WNOHANG),
        Ok(Wait::Child(other))
    );
    assert_eq!(sched.platform().user_mem.get(&(1, 0x80)), Some(&9));
}

#[test]
fn test_only_own_children_are_considered() {
    let mut sched = boot();
    let (child, _) = spawn(&mut sched);
    run_as(&mut sched, child);
    let (_, grandchild_slot) = spawn(&mut sched);
    sched.task_mut(grandchild_slot).unwrap().state = TaskState::Zombie;

    run_as(&mut sched, 1);
    assert_eq!(
        sched.sys_waitpid(-1, None, WaitOptions::WNOHANG),
        Ok(Wait::NoHang)
    );
    assert!(sched.task(grandchild_slot).is_some());
}

#[test]
fn test_blocking_wait_reaps_after_child_exit() {
    let mut sched = boot();
    let (pid, slot) = spawn(&mut sched);

    assert_eq!(
        sched.sys_waitpid(-1, Some(0x300), WaitOptions::empty()),
        Ok(Wait::Blocked)
    );
    assert_eq!(sched.task(1).unwrap().state, TaskState::Interruptible);
    assert_eq!(sched.current_slot(), slot);

    // 子进程退出，SIGCHLD 唤醒父进程，父进程完成回收
    sched.sys_exit(5);
    assert_eq!(sched.current_slot(), 1);
    let init = sched.current();
    assert_eq!(init.context.x0, pid as u64);
    assert_eq!(init.signal.pending, 0);
    assert!(init.resume.is_none());
    assert!(sched.task(slot).is_none());
    assert_eq!(sched.platform().user_mem.get(&(1, 0x300)), Some(&0x500));
}

#[test]
fn test_blocking_wait_interrupted_by_other_signal() {
    let mut sched = boot();
    let (_, slot) = spawn(&mut sched);

    assert_eq!(
        sched.sys_waitpid(-1, None, WaitOptions::empty()),
        Ok(Wait::Blocked)
    );
    assert_eq!(sched.current_slot(), slot);

    sched.sys_kill(1, Signal::SIGUSR1 as SigType).unwrap();
    sched.current_mut().counter = 0;
    sched.schedule();

    assert_eq!(sched.current_slot(), 1);
    let init = sched.current();
    assert_eq!(init.context.x0 as i64, Errno::InterruptedSystemCall.as_neg_isize() as i64);
    assert!(init.signal.is_pending(Signal::SIGUSR1 as SigType));
    assert!(sched.task(slot).is_some());
}

#[test]
fn test_idle_wait_only_yields() {
    let mut sched = bare();
    let pid = sched.sys_fork().unwrap();

    assert_eq!(
        sched.sys_waitpid(-1, None, WaitOptions::empty()),
        Ok(Wait::NoHang)
    );
    let idle = sched.task(0).unwrap();
    assert_eq!(idle.state, TaskState::Running);
    assert!(idle.resume.is_none());
    assert_eq!(sched.current_pid(), pid);
}
