//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 进程退出、回收和信号发送
//!
//! 参考 Linux 0.11 kernel/exit.c：
//! - `release()`: 清空槽位并释放内核栈页
//! - `send_sig()` / `kill_session()` / `sys_kill()`
//! - `tell_father()` / `do_exit()` / `sys_exit()`
//! - `sys_waitpid()`: 回收僵尸子进程

use alloc::vec::Vec;
use bitflags::bitflags;
use log::{debug, info, warn};

use crate::arch::Platform;
use crate::config::NR_OPEN;
use crate::errno::{Errno, KResult};
use crate::sched::Scheduler;
use crate::signal::{sigmask, valid_signal, SigType, Signal};

use super::task::{Pid, TaskState, INIT_PID};
use super::wait::Resume;

bitflags! {
    /// waitpid 选项
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct WaitOptions: u32 {
        /// 没有可回收的子进程时立即返回
        const WNOHANG   = 1;
        /// 同时报告已停止的子进程
        const WUNTRACED = 2;
    }
}

/// 停止的子进程报告的状态字
pub const STOPPED_STATUS: u32 = 0x7f;

/// waitpid 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wait {
    /// 回收或报告了一个子进程
    Child(Pid),
    /// WNOHANG 且子进程都还在运行
    NoHang,
    /// 已阻塞，结果稍后写入调用者的 x0
    Blocked,
}

impl<P: Platform> Scheduler<P> {
    /// 释放任务并重新调度
    ///
    /// 任务不存在属于内部状态损坏，直接 panic。
    pub fn release(&mut self, pid: Pid) {
        self.release_slot(pid);
        self.schedule();
    }

    /// 只清空槽位，不调度
    pub(crate) fn release_slot(&mut self, pid: Pid) {
        let Some(slot) = self.tasks.slot_of(pid).filter(|&slot| slot != 0) else {
            panic!("trying to release non-existent task");
        };
        if let Some(task) = self.tasks.remove(slot) {
            if let Some(page) = task.kernel_stack {
                self.platform.free_page(page);
            }
        }
        if self.last_task_used_math == Some(slot) {
            self.last_task_used_math = None;
        }
        debug!("release: pid {} (slot {})", pid, slot);
    }

    /// 向槽位 `slot` 上的任务发送信号
    ///
    /// `forced` 为内核内部发送，跳过权限检查；否则要求有效用户 ID 相同或调用者是超级用户。
    pub fn send_sig(&mut self, sig: SigType, slot: usize, forced: bool) -> KResult<()> {
        if !valid_signal(sig) {
            return Err(Errno::InvalidArgument);
        }
        let euid = self.current().cred.euid;
        let Some(task) = self.tasks.get_mut(slot) else {
            return Err(Errno::InvalidArgument);
        };
        if forced || task.cred.euid == euid || euid == 0 {
            task.signal.raise(sig);
            Ok(())
        } else {
            warn!("kill: euid {} may not signal pid {} (euid {})", euid, task.pid, task.cred.euid);
            Err(Errno::OperationNotPermitted)
        }
    }

    /// 向同一会话的所有任务发送 SIGHUP
    pub fn kill_session(&mut self) {
        let session = self.current().session;
        for (_, task) in self.tasks.iter_mut().filter(|(slot, _)| *slot != 0) {
            if task.session == session {
                task.signal.raise(Signal::SIGHUP as SigType);
            }
        }
        debug!("kill_session: SIGHUP to session {}", session);
    }

    /// kill 系统调用
    ///
    /// - `pid > 0`: 指定进程
    /// - `pid == 0`: 调用者所在进程组（强制发送）
    /// - `pid == -1`: 除 idle 外的所有任务
    /// - `pid < -1`: 进程组 `-pid`
    ///
    /// 广播不会因单个目标失败而中止，返回最后一个错误。
    pub fn sys_kill(&mut self, pid: Pid, sig: SigType) -> KResult<()> {
        if !valid_signal(sig) {
            return Err(Errno::InvalidArgument);
        }
        let pgrp = self.current().pgrp;
        let targets: Vec<usize> = self
            .tasks
            .iter()
            .rev()
            .filter(|(slot, task)| {
                *slot != 0
                    && match pid {
                        p if p > 0 => task.pid == p,
                        0 => task.pgrp == pgrp,
                        -1 => true,
                        p => p.checked_neg() == Some(task.pgrp),
                    }
            })
            .map(|(slot, _)| slot)
            .collect();

        let forced = pid == 0;
        let mut result = Ok(());
        for slot in targets {
            if let Err(err) = self.send_sig(sig, slot, forced) {
                result = Err(err);
            }
        }
        result
    }

    /// 通知父进程：给 PID 为 `father` 的任务置 SIGCHLD
    ///
    /// 找不到父进程时当场释放自己，返回 `true`。
    fn tell_father(&mut self, father: Pid) -> bool {
        if father != 0 {
            if let Some(slot) = self.tasks.slot_of(father) {
                if let Some(task) = self.tasks.get_mut(slot) {
                    task.signal.raise(Signal::SIGCHLD as SigType);
                }
                return false;
            }
        }
        let pid = self.current().pid;
        warn!("exit: no father found for pid {}, releasing itself", pid);
        self.release(pid);
        true
    }

    /// 进程退出
    ///
    /// 对应 Linux 0.11 的 do_exit()：释放地址空间，子进程过继给 init，
    /// 关闭文件，释放 inode，会话首领挂断会话，进入僵尸状态并通知父进程。
    pub fn do_exit(&mut self, code: i32) {
        let slot = self.current;
        if slot == 0 {
            panic!("task[0] trying to exit");
        }
        let (pid, father, mem) = {
            let task = self.current();
            (task.pid, task.father, task.mem)
        };
        self.platform.free_mem(slot, &mem);

        let mut zombie_orphan = false;
        for (_, task) in self.tasks.iter_mut() {
            if task.father == pid {
                task.father = INIT_PID;
                zombie_orphan |= task.state == TaskState::Zombie;
            }
        }
        if zombie_orphan {
            if let Some((_, init)) = self.tasks.iter_mut().find(|(_, t)| t.pid == INIT_PID) {
                init.signal.raise(Signal::SIGCHLD as SigType);
            }
        }

        let task = self.current_mut();
        let filp = core::mem::replace(&mut task.filp, [None; NR_OPEN]);
        let inodes = [task.pwd.take(), task.root.take(), task.executable.take()];
        let leader = task.leader;
        let tty = task.tty;

        for (fd, file) in filp.into_iter().enumerate() {
            if let Some(file) = file {
                self.platform.close(fd, file);
            }
        }
        for inode in inodes.into_iter().flatten() {
            self.platform.iput(inode);
        }
        if leader {
            if let Some(tty) = tty {
                self.platform.tty_detach(tty);
            }
        }
        if self.last_task_used_math == Some(slot) {
            self.last_task_used_math = None;
        }
        if leader {
            self.kill_session();
        }

        let task = self.current_mut();
        task.state = TaskState::Zombie;
        task.exit_code = code;
        info!("exit: pid {} code {:#x}", pid, code);

        if self.tell_father(father) {
            return;
        }
        self.schedule();
    }

    /// exit 系统调用
    pub fn sys_exit(&mut self, status: i32) {
        self.do_exit((status & 0xff) << 8);
    }

    /// waitpid 系统调用
    ///
    /// `pid` 选择子进程：`> 0` 指定进程，`0` 调用者的进程组，`-1` 任意子进程，
    /// `< -1` 进程组 `-pid`。状态字经 `put_user` 写到 `stat_addr`。
    pub fn sys_waitpid(
        &mut self,
        pid: Pid,
        stat_addr: Option<u64>,
        options: WaitOptions,
    ) -> KResult<Wait> {
        let waiter = self.current;
        if let Some(child) = self.wait_scan(waiter, pid, options, stat_addr, true)? {
            return Ok(Wait::Child(child));
        }
        if options.contains(WaitOptions::WNOHANG) {
            return Ok(Wait::NoHang);
        }
        // idle 不能阻塞，只让出 CPU
        if waiter == 0 {
            self.schedule();
            return Ok(Wait::NoHang);
        }

        let task = self.current_mut();
        task.state = TaskState::Interruptible;
        task.resume = Some(Resume::WaitChild {
            pid,
            options,
            stat_addr,
        });
        self.schedule();
        Ok(Wait::Blocked)
    }

    /// 扫描 `waiter` 的子进程
    ///
    /// - `Ok(Some(pid))`: 报告了停止的子进程或回收了僵尸子进程
    /// - `Ok(None)`: 有匹配的子进程但都不可回收
    /// - `Err(NoChild)`: 没有匹配的子进程
    fn wait_scan(
        &mut self,
        waiter: usize,
        pid: Pid,
        options: WaitOptions,
        stat_addr: Option<u64>,
        reschedule: bool,
    ) -> KResult<Option<Pid>> {
        let Some((me, my_pgrp)) = self.tasks.get(waiter).map(|t| (t.pid, t.pgrp)) else {
            return Err(Errno::NoChild);
        };

        let mut busy = false;
        let mut stopped = None;
        let mut zombie = None;
        for (slot, child) in self.tasks.iter().rev() {
            if slot == 0 || slot == waiter || child.father != me {
                continue;
            }
            let matches = match pid {
                p if p > 0 => child.pid == p,
                0 => child.pgrp == my_pgrp,
                -1 => true,
                p => p.checked_neg() == Some(child.pgrp),
            };
            if !matches {
                continue;
            }
            match child.state {
                TaskState::Stopped => {
                    if !options.contains(WaitOptions::WUNTRACED) {
                        continue;
                    }
                    stopped = Some(child.pid);
                    break;
                }
                TaskState::Zombie => {
                    zombie = Some((child.pid, child.times.utime, child.times.stime, child.exit_code));
                    break;
                }
                _ => busy = true,
            }
        }

        if let Some(child) = stopped {
            self.put_status(waiter, stat_addr, STOPPED_STATUS)?;
            return Ok(Some(child));
        }
        if let Some((child, utime, stime, code)) = zombie {
            if let Some(task) = self.tasks.get_mut(waiter) {
                task.times.cutime += utime;
                task.times.cstime += stime;
            }
            if reschedule {
                self.release(child);
            } else {
                self.release_slot(child);
            }
            self.put_status(waiter, stat_addr, code as u32)?;
            debug!("wait: pid {} reaped pid {} status {:#x}", me, child, code);
            return Ok(Some(child));
        }
        if busy {
            Ok(None)
        } else {
            Err(Errno::NoChild)
        }
    }

    fn put_status(&mut self, waiter: usize, stat_addr: Option<u64>, status: u32) -> KResult<()> {
        match stat_addr {
            Some(addr) => self.platform.put_user(waiter, addr, status),
            None => Ok(()),
        }
    }

    /// waitpid 阻塞后被调度回来：清掉 SIGCHLD，有其他信号则返回 EINTR，否则重新扫描
    pub(crate) fn finish_wait(
        &mut self,
        slot: usize,
        pid: Pid,
        options: WaitOptions,
        stat_addr: Option<u64>,
    ) -> bool {
        let Some(task) = self.tasks.get_mut(slot) else {
            return true;
        };
        task.signal.pending &= !sigmask(Signal::SIGCHLD as SigType);
        if task.signal.pending != 0 {
            task.context.x0 = Errno::InterruptedSystemCall.as_neg_isize() as u64;
            return true;
        }

        let ret = match self.wait_scan(slot, pid, options, stat_addr, false) {
            Ok(Some(child)) => child as isize,
            Ok(None) => {
                if let Some(task) = self.tasks.get_mut(slot) {
                    task.state = TaskState::Interruptible;
                    task.resume = Some(Resume::WaitChild {
                        pid,
                        options,
                        stat_addr,
                    });
                }
                return false;
            }
            Err(err) => err.as_neg_isize(),
        };
        if let Some(task) = self.tasks.get_mut(slot) {
            task.context.x0 = ret as u64;
        }
        true
    }
}
