//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 调度器核心
//!
//! 对应 Linux 0.11 kernel/sched.c：
//! - `schedule()`: 信号唤醒、按剩余时间片选择、时间片衰减、切换
//! - `do_timer()`: 时钟中断处理，时间统计和定时器
//! - `add_timer()` / `sys_alarm()`
//! - `math_state_restore()`: 浮点单元的延迟切换
//!
//! 所有全局状态（任务表、current、jiffies、定时器池）都收拢在 `Scheduler` 中，
//! 由内核初始化时创建一次，显式传给每个操作。
//!
//! 内核入口总是运行到结束：阻塞操作在任务上记录一个续体 (`Resume`) 后调用
//! `schedule()`，调度器选中该任务时先替它完成续体，再切换过去。

use log::{info, warn};

use crate::arch::{CpuContext, Platform};
use crate::config::HZ;
use crate::ipc::ShmTable;
use crate::process::task::{Pid, Task, TaskState};
use crate::signal::{Signal, BLOCKABLE};

use super::pid::PidAllocator;
use super::table::TaskTable;
use super::timer::TimerList;

/// 定时器回调
pub type TimerFn<P> = fn(&mut Scheduler<P>, usize);

/// 调度器上下文
pub struct Scheduler<P: Platform> {
    pub(crate) tasks: TaskTable,
    /// 当前任务的槽位
    pub(crate) current: usize,
    /// 启动以来的时钟滴答数
    pub(crate) jiffies: u64,
    pub(crate) timers: TimerList<TimerFn<P>>,
    pub(crate) pids: PidAllocator,
    /// 浮点寄存器当前属于哪个槽位
    pub(crate) last_task_used_math: Option<usize>,
    pub(crate) shm: ShmTable,
    pub(crate) platform: P,
}

impl<P: Platform> Scheduler<P> {
    /// 创建调度器，0 号槽位放入 idle 任务并作为当前任务
    pub fn new(platform: P) -> Self {
        Self {
            tasks: TaskTable::new(Task::new_idle()),
            current: 0,
            jiffies: 0,
            timers: TimerList::new(),
            pids: PidAllocator::new(),
            last_task_used_math: None,
            shm: ShmTable::new(),
            platform,
        }
    }

    pub fn current(&self) -> &Task {
        match self.tasks.get(self.current) {
            Some(task) => task,
            None => panic!("current task slot {} is empty", self.current),
        }
    }

    pub fn current_mut(&mut self) -> &mut Task {
        let slot = self.current;
        match self.tasks.get_mut(slot) {
            Some(task) => task,
            None => panic!("current task slot {} is empty", slot),
        }
    }

    #[inline]
    pub fn current_slot(&self) -> usize {
        self.current
    }

    #[inline]
    pub fn current_pid(&self) -> Pid {
        self.current().pid
    }

    #[inline]
    pub fn jiffies(&self) -> u64 {
        self.jiffies
    }

    pub fn task(&self, slot: usize) -> Option<&Task> {
        self.tasks.get(slot)
    }

    pub fn task_mut(&mut self, slot: usize) -> Option<&mut Task> {
        self.tasks.get_mut(slot)
    }

    pub fn find_task_by_pid(&self, pid: Pid) -> Option<&Task> {
        self.tasks.slot_of(pid).and_then(|slot| self.tasks.get(slot))
    }

    pub fn nr_tasks(&self) -> usize {
        self.tasks.nr_tasks()
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    /// 把 `pid` 对应的任务置为可运行
    pub(crate) fn wake_pid(&mut self, pid: Pid) {
        if let Some(task) = self.tasks.iter_mut().find(|(_, t)| t.pid == pid).map(|(_, t)| t) {
            if task.state != TaskState::Zombie {
                task.state = TaskState::Running;
            }
        }
    }

    /// 调度
    ///
    /// 对应 Linux 0.11 的 schedule()
    pub fn schedule(&mut self) {
        let jiffies = self.jiffies;

        // 检查 alarm，唤醒收到未阻塞信号的可中断任务
        for (_, task) in self.tasks.iter_mut().rev().filter(|(slot, _)| *slot != 0) {
            if task.alarm != 0 && task.alarm < jiffies {
                task.signal.raise(Signal::SIGALRM as i32);
                task.alarm = 0;
            }
            if task.signal.pending & !(BLOCKABLE & task.signal.blocked) != 0
                && task.state == TaskState::Interruptible
            {
                task.state = TaskState::Running;
            }
        }

        let prev = self.current;
        let next = loop {
            let next = self.pick_next_task();
            // 续体可能再次阻塞，此时重新选择
            if next == 0 || self.resume_task(next) {
                break next;
            }
        };

        self.context_switch(prev, next);
    }

    /// 选出剩余时间片最大的可运行任务
    ///
    /// 从最高槽位向下扫描，相等时先找到的胜出。全部可运行任务的时间片都用完时，
    /// 所有任务 `counter = counter / 2 + priority` 后重新选择；没有可运行任务时选 idle。
    fn pick_next_task(&mut self) -> usize {
        loop {
            let mut c = -1;
            let mut next = 0;
            for (slot, task) in self.tasks.iter().rev() {
                if slot == 0 {
                    continue;
                }
                if task.state == TaskState::Running && task.counter > c {
                    c = task.counter;
                    next = slot;
                }
            }
            if c != 0 {
                return next;
            }
            for (_, task) in self.tasks.iter_mut().filter(|(slot, _)| *slot != 0) {
                task.counter = (task.counter >> 1) + task.priority;
            }
        }
    }

    fn context_switch(&mut self, prev: usize, next: usize) {
        self.current = next;
        if prev == next {
            return;
        }

        #[cfg(feature = "debug_log")]
        log::trace!(
            "sched: switch slot {} -> slot {} (pid {})",
            prev,
            next,
            self.tasks.get(next).map_or(-1, |t| t.pid)
        );

        let Some(next_ctx) = self.tasks.get(next).map(|t| t.context.clone()) else {
            return;
        };
        // 前一个任务可能已经被释放（没有父进程时的自我释放）
        let mut scratch = CpuContext::default();
        let prev_ctx = match self.tasks.get_mut(prev) {
            Some(task) => &mut task.context,
            None => &mut scratch,
        };
        self.platform.switch_to(prev_ctx, &next_ctx);
    }

    /// 时钟中断处理
    ///
    /// 对应 Linux 0.11 的 do_timer(cpl)，`user_mode` 表示中断发生在用户态
    pub fn do_timer(&mut self, user_mode: bool) {
        self.jiffies += 1;

        let current = self.current_mut();
        if user_mode {
            current.times.utime += 1;
        } else {
            current.times.stime += 1;
        }

        self.timers.tick();
        while let Some((func, data)) = self.timers.pop_expired() {
            func(self, data);
        }

        let current = self.current_mut();
        current.counter -= 1;
        if current.counter > 0 {
            return;
        }
        current.counter = 0;
        // 内核态不抢占
        if !user_mode {
            return;
        }
        self.schedule();
    }

    /// 添加内核定时器
    ///
    /// `delay` 不大于 0 时立即调用回调。请求池耗尽时 panic。
    pub fn add_timer(&mut self, delay: i64, func: TimerFn<P>, data: usize) {
        if delay <= 0 {
            func(self, data);
            return;
        }
        if !self.timers.add(delay, func, data) {
            warn!("timer: all {} time requests in use", crate::config::TIME_REQUESTS);
            panic!("No more time requests free");
        }
    }

    /// alarm 系统调用
    ///
    /// 替换当前任务的 alarm，返回旧 alarm 剩余的整秒数
    pub fn sys_alarm(&mut self, seconds: i64) -> u64 {
        let jiffies = self.jiffies;
        let task = self.current_mut();
        let old = if task.alarm != 0 {
            task.alarm.saturating_sub(jiffies) / HZ
        } else {
            0
        };
        task.alarm = if seconds > 0 {
            jiffies.saturating_add(HZ.saturating_mul(seconds as u64))
        } else {
            0
        };
        old
    }

    /// 设备不可用异常：浮点单元的延迟切换
    ///
    /// 对应 Linux 0.11 的 math_state_restore()
    pub fn math_state_restore(&mut self) {
        let current = self.current;
        if self.last_task_used_math == Some(current) {
            return;
        }
        if let Some(owner) = self.last_task_used_math {
            if let Some(task) = self.tasks.get_mut(owner) {
                self.platform.save_fpu(&mut task.fpu);
            }
        }
        self.last_task_used_math = Some(current);

        let Some(task) = self.tasks.get_mut(current) else {
            return;
        };
        if task.used_math {
            self.platform.restore_fpu(&task.fpu);
        } else {
            self.platform.init_fpu();
            task.used_math = true;
        }
    }

    /// 打印任务表
    ///
    /// 对应 Linux 0.11 的 show_stat()
    pub fn show_stat(&self) {
        info!("task table: {} tasks, jiffies {}", self.tasks.nr_tasks(), self.jiffies);
        for (slot, task) in self.tasks.iter() {
            info!(
                "{}: pid={}, state={:?}, father={}, counter={}, priority={}",
                slot, task.pid, task.state, task.father, task.counter, task.priority
            );
        }
    }
}
