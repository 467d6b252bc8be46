//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! PID 管理
//!
//! - PID 0: idle 进程
//! - PID 1: init 进程
//! - PID 2+: 普通 PID
//!
//! 对应 Linux 0.11 fork.c 的 last_pid：单调递增，溢出后回到 1，
//! 跳过仍被占用（包括僵尸进程）的 PID。

use crate::process::task::Pid;

pub struct PidAllocator {
    last_pid: Pid,
}

impl PidAllocator {
    pub const fn new() -> Self {
        Self { last_pid: 0 }
    }

    /// 分配下一个未被占用的 PID
    pub fn alloc(&mut self, in_use: impl Fn(Pid) -> bool) -> Pid {
        loop {
            self.last_pid = self.last_pid.wrapping_add(1);
            if self.last_pid <= 0 {
                self.last_pid = 1;
            }
            if !in_use(self.last_pid) {
                return self.last_pid;
            }
        }
    }

    pub fn last_pid(&self) -> Pid {
        self.last_pid
    }

    #[cfg(test)]
    pub(crate) fn set_last_pid(&mut self, pid: Pid) {
        self.last_pid = pid;
    }
}

impl Default for PidAllocator {
    fn default() -> Self {
        Self::new()
    }
}
