//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 标准错误代码定义
//!
//! 和 include/uapi/asm-generic/errno-base.h 保持一致，只保留进程子系统用到的部分

/// 标准错误代码
///
/// 使用方法：
/// ```rust
/// use rux_proc::errno::{Errno, KResult};
///
/// fn check(sig: i32) -> KResult<()> {
///     if !(1..=32).contains(&sig) {
///         return Err(Errno::InvalidArgument);
///     }
///     Ok(())
/// }
///
/// assert_eq!(check(0), Err(Errno::InvalidArgument));
/// assert_eq!(Errno::InvalidArgument.as_neg_i32(), -22);
/// ```
#[repr(i32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Errno {
    /// Operation not permitted (EPERM, 1)
    OperationNotPermitted = 1,

    /// No such process (ESRCH, 3)
    ///
    /// 只为保持编号完整，本子系统不产生该错误（kill 找不到目标时返回成功）
    NoSuchProcess = 3,

    /// Interrupted system call (EINTR, 4)
    InterruptedSystemCall = 4,

    /// No child process (ECHILD, 10)
    NoChild = 10,

    /// Try again (EAGAIN, 11)
    TryAgain = 11,

    /// Out of memory (ENOMEM, 12)
    OutOfMemory = 12,

    /// Bad address (EFAULT, 14)
    BadAddress = 14,

    /// Invalid argument (EINVAL, 22)
    InvalidArgument = 22,

    /// No space left on device (ENOSPC, 28)
    NoSpaceLeftOnDevice = 28,

    /// Function not implemented (ENOSYS, 38)
    FunctionNotImplemented = 38,
}

impl Errno {
    /// 获取错误代码的正数值（用于比较）
    #[inline]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// 获取错误代码的负数值（用于系统调用返回）
    #[inline]
    pub const fn as_neg_i32(self) -> i32 {
        -(self as i32)
    }

    /// 获取错误代码的负数值（isize，用于系统调用返回寄存器）
    #[inline]
    pub const fn as_neg_isize(self) -> isize {
        -(self as i32) as isize
    }
}

/// 内核内部统一的返回类型
pub type KResult<T> = Result<T, Errno>;
