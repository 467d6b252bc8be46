//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 系统调用
//!
//! 对应 Linux 0.11 include/linux/sys.h 的 sys_call_table，只包含进程相关的部分。
//! 陷入处理程序按调用号进入 `Scheduler::syscall`，错误转换为负的 errno。

use crate::arch::Platform;
use crate::errno::{Errno, KResult};
use crate::process::exit::{Wait, WaitOptions};
use crate::process::task::{Pid, TaskState};
use crate::sched::Scheduler;
use crate::signal::SigAction;

pub const SYS_EXIT: usize = 1;
pub const SYS_FORK: usize = 2;
pub const SYS_WAITPID: usize = 7;
pub const SYS_GETPID: usize = 20;
pub const SYS_GETUID: usize = 24;
pub const SYS_ALARM: usize = 27;
pub const SYS_PAUSE: usize = 29;
pub const SYS_NICE: usize = 34;
pub const SYS_KILL: usize = 37;
pub const SYS_GETGID: usize = 47;
pub const SYS_SIGNAL: usize = 48;
pub const SYS_GETEUID: usize = 49;
pub const SYS_GETEGID: usize = 50;
pub const SYS_GETPPID: usize = 64;
pub const SYS_SIGACTION: usize = 67;
pub const SYS_SGETMASK: usize = 68;
pub const SYS_SSETMASK: usize = 69;
pub const SYS_SHMGET: usize = 87;
pub const SYS_SHMAT: usize = 88;

/// 系统调用的返回方式
enum SysRet {
    /// 立即返回
    Value(isize),
    /// 调用者已退出或阻塞，返回值由续体写入
    Deferred,
}

impl<P: Platform> Scheduler<P> {
    pub fn sys_getpid(&self) -> Pid {
        self.current().pid
    }

    pub fn sys_getppid(&self) -> Pid {
        self.current().father
    }

    pub fn sys_getuid(&self) -> u16 {
        self.current().cred.uid
    }

    pub fn sys_geteuid(&self) -> u16 {
        self.current().cred.euid
    }

    pub fn sys_getgid(&self) -> u16 {
        self.current().cred.gid
    }

    pub fn sys_getegid(&self) -> u16 {
        self.current().cred.egid
    }

    /// 降低（或提高）静态优先级，结果必须仍为正数
    pub fn sys_nice(&mut self, increment: i32) -> i32 {
        let task = self.current_mut();
        if let Some(priority) = task.priority.checked_sub(increment).filter(|&p| p > 0) {
            task.priority = priority;
        }
        0
    }

    /// 可中断睡眠直到收到信号
    pub fn sys_pause(&mut self) -> i32 {
        // idle 只让出 CPU，不进入睡眠
        if self.current != 0 {
            self.current_mut().state = TaskState::Interruptible;
        }
        self.schedule();
        0
    }

    /// 系统调用入口
    ///
    /// 返回值同时写入调用者保存的 `x0`。调用者退出或阻塞时返回 `None`，
    /// 此时返回值由阻塞操作完成时写入。
    pub fn syscall(&mut self, nr: usize, args: [u64; 3]) -> Option<isize> {
        let caller = self.current;
        let ret = match self.dispatch(nr, args) {
            Ok(SysRet::Value(value)) => value,
            Ok(SysRet::Deferred) => return None,
            Err(err) => err.as_neg_isize(),
        };
        if let Some(task) = self.tasks.get_mut(caller) {
            task.context.x0 = ret as u64;
        }
        Some(ret)
    }

    fn dispatch(&mut self, nr: usize, args: [u64; 3]) -> KResult<SysRet> {
        let value = match nr {
            SYS_EXIT => {
                self.sys_exit(args[0] as i32);
                return Ok(SysRet::Deferred);
            }
            SYS_FORK => self.sys_fork()? as isize,
            SYS_WAITPID => {
                let stat_addr = (args[1] != 0).then_some(args[1]);
                let options = WaitOptions::from_bits_truncate(args[2] as u32);
                match self.sys_waitpid(args[0] as Pid, stat_addr, options)? {
                    Wait::Child(pid) => pid as isize,
                    Wait::NoHang => 0,
                    Wait::Blocked => return Ok(SysRet::Deferred),
                }
            }
            SYS_GETPID => self.sys_getpid() as isize,
            SYS_GETUID => self.sys_getuid() as isize,
            SYS_ALARM => self.sys_alarm(args[0] as i64) as isize,
            SYS_PAUSE => self.sys_pause() as isize,
            SYS_NICE => self.sys_nice(args[0] as i32) as isize,
            SYS_KILL => {
                self.sys_kill(args[0] as Pid, args[1] as i32)?;
                0
            }
            SYS_GETGID => self.sys_getgid() as isize,
            SYS_SIGNAL => self.sys_signal(args[0] as i32, args[1], args[2])? as isize,
            SYS_GETEUID => self.sys_geteuid() as isize,
            SYS_GETEGID => self.sys_getegid() as isize,
            SYS_GETPPID => self.sys_getppid() as isize,
            SYS_SIGACTION => {
                let new = match args[1] {
                    0 => None,
                    addr => Some(self.read_sigaction(addr)?),
                };
                let old = self.sys_sigaction(args[0] as i32, new)?;
                if args[2] != 0 {
                    self.write_sigaction(args[2], &old)?;
                }
                0
            }
            SYS_SGETMASK => self.sys_sgetmask() as isize,
            SYS_SSETMASK => self.sys_ssetmask(args[0] as u32) as isize,
            SYS_SHMGET => self.sys_shmget(args[0] as u32, args[1] as usize)? as isize,
            SYS_SHMAT => self.sys_shmat(args[0] as i32)? as isize,
            _ => return Err(Errno::FunctionNotImplemented),
        };
        Ok(SysRet::Value(value))
    }

    fn read_sigaction(&mut self, addr: u64) -> KResult<SigAction> {
        let nr = self.current;
        let mut words = [0u32; SigAction::WORDS];
        for (i, word) in words.iter_mut().enumerate() {
            *word = self.platform.get_user(nr, addr + 4 * i as u64)?;
        }
        Ok(SigAction::from_words(words))
    }

    fn write_sigaction(&mut self, addr: u64, action: &SigAction) -> KResult<()> {
        let nr = self.current;
        for (i, word) in action.to_words().into_iter().enumerate() {
            self.platform.put_user(nr, addr + 4 * i as u64, word)?;
        }
        Ok(())
    }
}
