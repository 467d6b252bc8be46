//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 信号系统调用和信号投递
//!
//! 参考 Linux 0.11 kernel/signal.c：
//! - `sys_sgetmask` / `sys_ssetmask`: 阻塞位图，SIGKILL 永远不能被阻塞
//! - `sys_signal`: 一次性处理函数
//! - `sys_sigaction`: 通用形式，返回旧的处理动作
//! - `do_signal`: 返回用户态前投递编号最小的未阻塞信号

use log::debug;

use crate::arch::Platform;
use crate::errno::{Errno, KResult};
use crate::sched::Scheduler;
use crate::signal::{
    sigmask, valid_signal, ReturnAction, SaFlags, SigAction, SigHandler, SigType, Signal, SignalFrame,
};

/// 可以安装处理动作的信号
fn check_catchable(sig: SigType) -> KResult<()> {
    if !valid_signal(sig) || sig == Signal::SIGKILL as SigType {
        return Err(Errno::InvalidArgument);
    }
    Ok(())
}

impl<P: Platform> Scheduler<P> {
    pub fn sys_sgetmask(&self) -> u32 {
        self.current().signal.blocked
    }

    /// 替换阻塞位图，返回旧值
    pub fn sys_ssetmask(&mut self, newmask: u32) -> u32 {
        let signal = &mut self.current_mut().signal;
        let old = signal.blocked;
        signal.blocked = newmask & !Signal::SIGKILL.mask();
        old
    }

    /// signal 系统调用
    ///
    /// 安装的处理函数只生效一次，执行期间不屏蔽任何信号。返回旧的处理函数原始值。
    pub fn sys_signal(&mut self, sig: SigType, handler: u64, restorer: u64) -> KResult<u64> {
        check_catchable(sig)?;
        let action = SigAction {
            handler: SigHandler::from_raw(handler),
            mask: 0,
            flags: SaFlags::SA_ONESHOT | SaFlags::SA_NOMASK,
            restorer,
        };
        let slot = self.current_mut().signal.action_mut(sig);
        let old = slot.handler.into_raw();
        *slot = action;
        Ok(old)
    }

    /// sigaction 系统调用
    ///
    /// `new` 为 `None` 时只查询。SA_NOMASK 时屏蔽字清零，否则信号自身总被加入屏蔽字。
    /// 屏蔽字里的 SIGKILL 位总被去掉。
    pub fn sys_sigaction(&mut self, sig: SigType, new: Option<SigAction>) -> KResult<SigAction> {
        check_catchable(sig)?;
        let slot = self.current_mut().signal.action_mut(sig);
        let old = *slot;
        if let Some(mut action) = new {
            if action.flags.contains(SaFlags::SA_NOMASK) {
                action.mask = 0;
            } else {
                action.mask |= sigmask(sig);
            }
            action.mask &= !Signal::SIGKILL.mask();
            *slot = action;
        }
        Ok(old)
    }

    /// 返回用户态前的信号投递
    ///
    /// 取编号最小的待处理且未阻塞信号并清掉其待处理位：
    /// - 忽略：无动作
    /// - 默认：SIGCHLD 无动作，其他信号以该信号编码退出
    /// - 处理函数：一次性的先恢复默认，然后改写返回地址到处理函数、
    ///   下移用户栈并生成信号帧，处理期间阻塞 `mask`
    pub fn do_signal(&mut self) -> ReturnAction {
        let task = self.current_mut();
        let Some(sig) = task.signal.next_deliverable() else {
            return ReturnAction::Resume;
        };
        task.signal.pending &= !sigmask(sig);

        let action = *task.signal.action(sig);
        let addr = match action.handler {
            SigHandler::Ignore => return ReturnAction::Resume,
            SigHandler::Default => {
                if sig == Signal::SIGCHLD as SigType {
                    return ReturnAction::Resume;
                }
                self.do_exit(sigmask(sig) as i32);
                return ReturnAction::Exited;
            }
            SigHandler::Handler(addr) => addr,
        };

        if action.flags.contains(SaFlags::SA_ONESHOT) {
            task.signal.action_mut(sig).handler = SigHandler::Default;
        }

        let nomask = action.flags.contains(SaFlags::SA_NOMASK);
        let ctx = &mut task.context;
        let frame = SignalFrame {
            restorer: action.restorer,
            signr: sig,
            blocked: (!nomask).then_some(task.signal.blocked),
            x0: ctx.x0,
            x1: ctx.x1,
            x2: ctx.x2,
            pstate: ctx.pstate,
            pc: ctx.pc,
        };
        ctx.pc = addr;
        ctx.sp = ctx.sp.wrapping_sub(frame.size());
        let sp = ctx.sp;
        task.signal.blocked |= action.mask & !Signal::SIGKILL.mask();

        debug!("signal: pid {} enters handler {:#x} for signal {}", task.pid, addr, sig);
        ReturnAction::Handler { frame, sp }
    }
}
