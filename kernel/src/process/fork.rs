//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 进程创建 (fork) 实现
//!
//! 参考 Linux 0.11 kernel/fork.c
//!
//! 流程:
//! 1. 分配 PID 和空闲槽位 (find_empty_process)
//! 2. 分配内核栈页，复制父进程的任务控制块
//! 3. 重置子进程的身份、时间片、信号和时间统计
//! 4. 复制地址空间 (copy_mem)，失败则回滚
//! 5. 增加继承的文件和 inode 引用计数
//! 6. 构造子进程的初始上下文，置为可运行

use alloc::boxed::Box;
use log::{debug, warn};

use crate::arch::Platform;
use crate::errno::{Errno, KResult};
use crate::sched::Scheduler;

use super::task::{CpuTimes, Pid, TaskState};

impl<P: Platform> Scheduler<P> {
    /// 分配新 PID 并找到空闲槽位
    ///
    /// PID 在失败时也已前进，与 last_pid 的行为一致。
    pub fn find_empty_process(&mut self) -> KResult<(Pid, usize)> {
        let tasks = &self.tasks;
        let pid = self.pids.alloc(|pid| tasks.pid_in_use(pid));
        match self.tasks.find_free() {
            Some(slot) => Ok((pid, slot)),
            None => Err(Errno::TryAgain),
        }
    }

    /// fork 系统调用
    ///
    /// 父进程返回子进程 PID；子进程第一次被调度时从同一位置返回 0。
    pub fn sys_fork(&mut self) -> KResult<Pid> {
        let (pid, nr) = self.find_empty_process()?;
        self.copy_process(nr, pid)
    }

    /// 在槽位 `nr` 创建当前任务的副本
    pub fn copy_process(&mut self, nr: usize, pid: Pid) -> KResult<Pid> {
        let Some(page) = self.platform.get_free_page() else {
            warn!("fork: no free page for kernel stack");
            return Err(Errno::TryAgain);
        };

        let parent_slot = self.current;
        let mut child = Box::new(self.current().clone());
        child.state = TaskState::Uninterruptible;
        child.pid = pid;
        child.father = self.current().pid;
        child.counter = child.priority;
        child.signal.pending = 0;
        child.alarm = 0;
        child.leader = false;
        child.times = CpuTimes {
            start_time: self.jiffies,
            ..CpuTimes::default()
        };
        child.kernel_stack = Some(page);
        child.resume = None;

        // 父进程持有浮点单元时先把寄存器刷回，再复制给子进程
        if self.last_task_used_math == Some(parent_slot) {
            let mut fpu = self.current().fpu;
            self.platform.save_fpu(&mut fpu);
            self.current_mut().fpu = fpu;
            child.fpu = fpu;
        }

        child.mem = match self.platform.copy_mem(nr, &child.mem) {
            Ok(mem) => mem,
            Err(err) => {
                warn!("fork: copy_mem for slot {} failed: {:?}", nr, err);
                self.platform.free_page(page);
                return Err(Errno::OutOfMemory);
            }
        };

        for file in child.filp.iter().flatten() {
            self.platform.file_dup(*file);
        }
        for inode in [child.pwd, child.root, child.executable].into_iter().flatten() {
            self.platform.inode_dup(inode);
        }

        let parent_ctx = self.current().context.clone();
        child.context = self.platform.construct_initial(&parent_ctx, page);
        child.state = TaskState::Running;
        self.tasks.insert(nr, child);

        debug!("fork: pid {} -> pid {} (slot {})", self.current().pid, pid, nr);
        Ok(pid)
    }
}
