//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 等待队列 (Wait Queue) 机制
//!
//! 遵循 Linux 0.11 kernel/sched.c 的 sleep_on / interruptible_sleep_on / wake_up：
//! - 等待队列只是一个指针单元，最多记录一个等待者
//! - 新的等待者入队时保存被替换的旧等待者，自己被唤醒后再唤醒它（后进先出链）
//! - `wake_up()` 只唤醒最近入队的那一个
//!
//! 调度不会挂起内核栈，所以"醒来后"的逻辑保存为任务上的续体 `Resume`，
//! 由调度器在选中该任务时执行。

use alloc::sync::Arc;

use spin::Mutex;

use crate::arch::Platform;
use crate::sched::Scheduler;

use super::exit::WaitOptions;
use super::task::{Pid, TaskState};

/// 等待队列
///
/// 由资源的所有者和睡眠者通过 `Arc` 共享
#[derive(Debug, Default)]
pub struct WaitQueue {
    anchor: Mutex<Option<Pid>>,
}

impl WaitQueue {
    pub const fn new() -> Self {
        Self {
            anchor: Mutex::new(None),
        }
    }

    /// 当前等待者
    pub fn occupant(&self) -> Option<Pid> {
        *self.anchor.lock()
    }

    fn replace(&self, pid: Pid) -> Option<Pid> {
        self.anchor.lock().replace(pid)
    }

    fn take(&self) -> Option<Pid> {
        self.anchor.lock().take()
    }
}

/// 阻塞任务被调度回来时要完成的工作
#[derive(Debug, Clone)]
pub enum Resume {
    /// sleep_on / interruptible_sleep_on 的后半段
    Sleep {
        queue: Arc<WaitQueue>,
        /// 入队时被替换的等待者
        prior: Option<Pid>,
        interruptible: bool,
    },
    /// waitpid 被唤醒后重新扫描子进程
    WaitChild {
        pid: Pid,
        options: WaitOptions,
        stat_addr: Option<u64>,
    },
}

impl<P: Platform> Scheduler<P> {
    /// 不可中断睡眠，只能被 `wake_up` 唤醒
    pub fn sleep_on(&mut self, queue: &Arc<WaitQueue>) {
        self.block_on(queue, false);
    }

    /// 可中断睡眠，未阻塞的信号也会唤醒
    pub fn interruptible_sleep_on(&mut self, queue: &Arc<WaitQueue>) {
        self.block_on(queue, true);
    }

    fn block_on(&mut self, queue: &Arc<WaitQueue>, interruptible: bool) {
        if self.current == 0 {
            panic!("task[0] trying to sleep");
        }
        let task = self.current_mut();
        let prior = queue.replace(task.pid);
        task.state = if interruptible {
            TaskState::Interruptible
        } else {
            TaskState::Uninterruptible
        };
        task.resume = Some(Resume::Sleep {
            queue: Arc::clone(queue),
            prior,
            interruptible,
        });
        self.schedule();
    }

    /// 唤醒等待队列上最近入队的任务
    pub fn wake_up(&mut self, queue: &WaitQueue) {
        if let Some(pid) = queue.take() {
            self.wake_pid(pid);
        }
    }

    /// 替 `slot` 上的任务完成挂起的续体
    ///
    /// 返回 `false` 表示续体让任务再次阻塞。
    pub(crate) fn resume_task(&mut self, slot: usize) -> bool {
        let Some(resume) = self.tasks.get_mut(slot).and_then(|t| t.resume.take()) else {
            return true;
        };
        match resume {
            Resume::Sleep {
                queue,
                prior,
                interruptible,
            } => self.finish_sleep(slot, queue, prior, interruptible),
            Resume::WaitChild {
                pid,
                options,
                stat_addr,
            } => self.finish_wait(slot, pid, options, stat_addr),
        }
    }

    fn finish_sleep(
        &mut self,
        slot: usize,
        queue: Arc<WaitQueue>,
        prior: Option<Pid>,
        interruptible: bool,
    ) -> bool {
        if interruptible {
            let me = self.tasks.get(slot).map(|t| t.pid);
            match queue.occupant() {
                // 被信号唤醒，但后来又有任务入队：先唤醒它，自己继续睡
                Some(other) if Some(other) != me => {
                    self.wake_pid(other);
                    if let Some(task) = self.tasks.get_mut(slot) {
                        task.state = TaskState::Interruptible;
                        task.resume = Some(Resume::Sleep {
                            queue,
                            prior,
                            interruptible,
                        });
                    }
                    return false;
                }
                _ => {
                    queue.take();
                }
            }
        }
        if let Some(prior) = prior {
            self.wake_pid(prior);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_replace() {
        let wq = WaitQueue::new();
        assert_eq!(wq.occupant(), None);
        assert_eq!(wq.replace(3), None);
        assert_eq!(wq.replace(5), Some(3));
        assert_eq!(wq.occupant(), Some(5));
        assert_eq!(wq.take(), Some(5));
        assert_eq!(wq.occupant(), None);
    }
}
