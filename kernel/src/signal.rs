//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 信号定义
//!
//! 遵循 Linux 0.11 的信号模型 (include/signal.h, kernel/signal.c)
//!
//! 核心概念：
//! - 每个任务一个 32 位待处理位图和 32 位阻塞位图
//! - 每个信号一个处理动作：默认、忽略或用户处理函数
//! - 信号只在返回用户态前投递 (do_signal)

use bitflags::bitflags;

use alloc::vec::Vec;

/// 信号编号类型
pub type SigType = i32;

/// 信号数量
pub const NSIG: usize = 32;

/// 标准信号定义
///
/// 对应 include/signal.h
#[repr(i32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Signal {
    /// SIGHUP - 挂起
    SIGHUP = 1,
    /// SIGINT - 中断 (Ctrl+C)
    SIGINT = 2,
    /// SIGQUIT - 退出
    SIGQUIT = 3,
    /// SIGILL - 非法指令
    SIGILL = 4,
    /// SIGTRAP - 断点陷阱
    SIGTRAP = 5,
    /// SIGABRT - 异常终止
    SIGABRT = 6,
    /// SIGUNUSED
    SIGUNUSED = 7,
    /// SIGFPE - 浮点异常
    SIGFPE = 8,
    /// SIGKILL - 强制杀死 (不可捕获/忽略/阻塞)
    SIGKILL = 9,
    /// SIGUSR1 - 用户定义信号1
    SIGUSR1 = 10,
    /// SIGSEGV - 段错误
    SIGSEGV = 11,
    /// SIGUSR2 - 用户定义信号2
    SIGUSR2 = 12,
    /// SIGPIPE - 管道破裂
    SIGPIPE = 13,
    /// SIGALRM - 定时器
    SIGALRM = 14,
    /// SIGTERM - 终止
    SIGTERM = 15,
    /// SIGSTKFLT - 栈错误
    SIGSTKFLT = 16,
    /// SIGCHLD - 子进程状态改变
    SIGCHLD = 17,
    /// SIGCONT - 继续
    SIGCONT = 18,
    /// SIGSTOP - 停止
    SIGSTOP = 19,
    /// SIGTSTP - 终端停止 (Ctrl+Z)
    SIGTSTP = 20,
    /// SIGTTIN - 后台读
    SIGTTIN = 21,
    /// SIGTTOU - 后台写
    SIGTTOU = 22,
}

impl Signal {
    #[inline]
    pub const fn mask(self) -> u32 {
        sigmask(self as SigType)
    }
}

/// 信号编号是否在 [1, 32] 内
#[inline]
pub const fn valid_signal(sig: SigType) -> bool {
    sig >= 1 && sig <= NSIG as SigType
}

/// 信号在位图中的位
///
/// 调用者保证 `sig` 合法。
#[inline]
pub const fn sigmask(sig: SigType) -> u32 {
    1u32 << (sig - 1)
}

/// 能被阻塞的信号
///
/// 对应 sched.c 的 `_BLOCKABLE`，唤醒可中断睡眠时忽略对这两个信号的阻塞。
pub const BLOCKABLE: u32 = !(sigmask(Signal::SIGKILL as SigType) | sigmask(Signal::SIGSTOP as SigType));

/// 用户态 SIG_DFL 的原始值
pub const SIG_DFL: u64 = 0;
/// 用户态 SIG_IGN 的原始值
pub const SIG_IGN: u64 = 1;

bitflags! {
    /// sa_flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SaFlags: u32 {
        /// 子进程停止时不发送 SIGCHLD
        const SA_NOCLDSTOP = 0x0000_0001;
        /// 处理函数执行期间不屏蔽任何信号
        const SA_NOMASK    = 0x4000_0000;
        /// 投递一次后恢复为默认动作
        const SA_ONESHOT   = 0x8000_0000;
    }
}

/// 信号处理方式
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum SigHandler {
    /// 默认动作 (SIG_DFL)
    #[default]
    Default,
    /// 忽略 (SIG_IGN)
    Ignore,
    /// 用户处理函数地址
    Handler(u64),
}

impl SigHandler {
    pub const fn from_raw(raw: u64) -> Self {
        match raw {
            SIG_DFL => SigHandler::Default,
            SIG_IGN => SigHandler::Ignore,
            addr => SigHandler::Handler(addr),
        }
    }

    pub const fn into_raw(self) -> u64 {
        match self {
            SigHandler::Default => SIG_DFL,
            SigHandler::Ignore => SIG_IGN,
            SigHandler::Handler(addr) => addr,
        }
    }
}

/// sigaction 结构体
///
/// 对应 include/signal.h 的 struct sigaction，用户态布局为 4 个 32 位字：
/// sa_handler, sa_mask, sa_flags, sa_restorer
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct SigAction {
    pub handler: SigHandler,
    /// 处理函数执行期间额外阻塞的信号
    pub mask: u32,
    pub flags: SaFlags,
    /// 用户态跳板地址，处理函数返回后由它恢复现场
    pub restorer: u64,
}

impl SigAction {
    /// 用户态结构体的字数
    pub const WORDS: usize = 4;

    pub fn from_words(words: [u32; Self::WORDS]) -> Self {
        Self {
            handler: SigHandler::from_raw(words[0] as u64),
            mask: words[1],
            flags: SaFlags::from_bits_retain(words[2]),
            restorer: words[3] as u64,
        }
    }

    pub fn to_words(&self) -> [u32; Self::WORDS] {
        [
            self.handler.into_raw() as u32,
            self.mask,
            self.flags.bits(),
            self.restorer as u32,
        ]
    }
}

/// 任务的信号状态
///
/// 对应 task_struct 中的 signal / blocked / sigaction[32]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalState {
    /// 待处理位图
    pub pending: u32,
    /// 阻塞位图
    pub blocked: u32,
    pub actions: [SigAction; NSIG],
}

impl SignalState {
    pub fn new() -> Self {
        Self {
            pending: 0,
            blocked: 0,
            actions: [SigAction::default(); NSIG],
        }
    }

    #[inline]
    pub fn raise(&mut self, sig: SigType) {
        self.pending |= sigmask(sig);
    }

    #[inline]
    pub fn is_pending(&self, sig: SigType) -> bool {
        self.pending & sigmask(sig) != 0
    }

    /// 编号最小的待处理且未阻塞的信号
    pub fn next_deliverable(&self) -> Option<SigType> {
        let ready = self.pending & !self.blocked;
        if ready == 0 {
            None
        } else {
            Some(ready.trailing_zeros() as SigType + 1)
        }
    }

    pub fn action(&self, sig: SigType) -> &SigAction {
        &self.actions[(sig - 1) as usize]
    }

    pub fn action_mut(&mut self, sig: SigType) -> &mut SigAction {
        &mut self.actions[(sig - 1) as usize]
    }
}

impl Default for SignalState {
    fn default() -> Self {
        Self::new()
    }
}

/// 压入用户栈的信号帧
///
/// 自低地址到高地址依次为：跳板地址、信号编号、投递前的阻塞位图
/// （SA_NOMASK 时省略）、x0、x1、x2、处理器状态、原返回地址。
/// 跳板据此恢复投递前的现场。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalFrame {
    pub restorer: u64,
    pub signr: SigType,
    pub blocked: Option<u32>,
    pub x0: u64,
    pub x1: u64,
    pub x2: u64,
    pub pstate: u64,
    pub pc: u64,
}

impl SignalFrame {
    pub fn words(&self) -> Vec<u64> {
        let mut words = Vec::with_capacity(8);
        words.push(self.restorer);
        words.push(self.signr as u64);
        if let Some(blocked) = self.blocked {
            words.push(blocked as u64);
        }
        words.extend_from_slice(&[self.x0, self.x1, self.x2, self.pstate, self.pc]);
        words
    }

    /// 帧占用的字节数
    pub fn size(&self) -> u64 {
        let nr = if self.blocked.is_some() { 8 } else { 7 };
        nr * core::mem::size_of::<u64>() as u64
    }
}

/// 返回用户态前需要执行的动作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnAction {
    /// 直接返回
    Resume,
    /// 任务已因默认动作退出
    Exited,
    /// 已改写 pc/sp，陷入返回路径需把 `frame` 写到新的用户栈顶 `sp`
    Handler { frame: SignalFrame, sp: u64 },
}
