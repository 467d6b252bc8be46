//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 任务控制块 (Task Control Block)
//!
//! 遵循 Linux 0.11 的 `struct task_struct` 定义 (include/linux/sched.h)
//!
//! 关键设计要点：
//! 1. 进程状态与 Linux 一致
//! 2. 调度字段：state / counter / priority
//! 3. 外部资源（文件、inode、地址空间）只保存引用

use crate::arch::{CpuContext, FpuState};
use crate::config::{INIT_PRIORITY, NR_OPEN};
use crate::fs::{FileRef, InodeRef};
use crate::mm::{MemRegion, PhysAddr};
use crate::signal::SignalState;

use super::wait::Resume;

/// 进程 ID
pub type Pid = i32;

/// idle 任务的 PID，永远占用 0 号槽位
pub const IDLE_PID: Pid = 0;

/// init 进程的 PID，孤儿进程的新父进程
pub const INIT_PID: Pid = 1;

/// 进程状态
///
/// 对应 include/linux/sched.h 的 TASK_* 定义
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum TaskState {
    /// 可运行状态 (TASK_RUNNING)
    /// 进程在 CPU 上运行或在等待被调度
    Running = 0,

    /// 可中断睡眠 (TASK_INTERRUPTIBLE)
    /// 可被显式唤醒或未阻塞的信号唤醒
    Interruptible = 1,

    /// 不可中断睡眠 (TASK_UNINTERRUPTIBLE)
    /// 只能被显式唤醒
    Uninterruptible = 2,

    /// 僵死状态 (TASK_ZOMBIE)
    /// 进程已退出，等待父进程回收
    Zombie = 3,

    /// 停止状态 (TASK_STOPPED)
    Stopped = 4,
}

/// 用户/组身份
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Credentials {
    pub uid: u16,
    pub euid: u16,
    pub suid: u16,
    pub gid: u16,
    pub egid: u16,
    pub sgid: u16,
}

/// CPU 时间统计（单位：时钟滴答）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTimes {
    /// 用户态时间
    pub utime: u64,
    /// 内核态时间
    pub stime: u64,
    /// 已回收子进程的用户态时间累计
    pub cutime: u64,
    /// 已回收子进程的内核态时间累计
    pub cstime: u64,
    /// 创建时的 jiffies
    pub start_time: u64,
}

/// 任务控制块
#[derive(Debug, Clone)]
pub struct Task {
    // ===== 调度 =====
    pub state: TaskState,
    /// 剩余时间片
    pub counter: i32,
    /// 静态优先级，衰减时加回 counter
    pub priority: i32,
    /// 绝对到期时刻（jiffies），0 表示未设置
    pub alarm: u64,

    // ===== 信号 =====
    pub signal: SignalState,
    pub exit_code: i32,

    // ===== 身份 =====
    pub pid: Pid,
    /// 父进程 PID
    pub father: Pid,
    pub pgrp: Pid,
    pub session: Pid,
    /// 是否会话首领
    pub leader: bool,
    pub cred: Credentials,

    pub times: CpuTimes,

    // ===== 资源 =====
    pub filp: [Option<FileRef>; NR_OPEN],
    pub pwd: Option<InodeRef>,
    pub root: Option<InodeRef>,
    pub executable: Option<InodeRef>,
    /// 控制终端
    pub tty: Option<u32>,
    pub mem: MemRegion,
    /// 堆顶（相对代码段基址）
    pub brk: u64,

    // ===== 上下文 =====
    pub context: CpuContext,
    /// 内核栈页，idle 任务没有
    pub kernel_stack: Option<PhysAddr>,
    pub fpu: FpuState,
    /// 是否使用过浮点
    pub used_math: bool,

    /// 阻塞时记录的续体，调度到该任务时完成
    pub resume: Option<Resume>,
}

impl Task {
    /// 0 号 idle 任务
    ///
    /// 对应 Linux 0.11 的 INIT_TASK
    pub fn new_idle() -> Self {
        Self {
            state: TaskState::Running,
            counter: INIT_PRIORITY,
            priority: INIT_PRIORITY,
            alarm: 0,
            signal: SignalState::new(),
            exit_code: 0,
            pid: IDLE_PID,
            father: IDLE_PID,
            pgrp: IDLE_PID,
            session: IDLE_PID,
            leader: false,
            cred: Credentials::default(),
            times: CpuTimes::default(),
            filp: [None; NR_OPEN],
            pwd: None,
            root: None,
            executable: None,
            tty: None,
            mem: MemRegion::default(),
            brk: 0,
            context: CpuContext::default(),
            kernel_stack: None,
            fpu: FpuState::default(),
            used_math: false,
            resume: None,
        }
    }

    #[inline]
    pub fn is_runnable(&self) -> bool {
        self.state == TaskState::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_task() {
        let idle = Task::new_idle();
        assert_eq!(idle.pid, IDLE_PID);
        assert_eq!(idle.state, TaskState::Running);
        assert_eq!(idle.counter, INIT_PRIORITY);
        assert_eq!(idle.priority, INIT_PRIORITY);
        assert_eq!(idle.signal.pending, 0);
        assert!(idle.filp.iter().all(Option::is_none));
        assert!(idle.resume.is_none());
    }
}
