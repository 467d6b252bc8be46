//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! Rux 进程管理核心
//!
//! 单核、抢占式多任务内核的进程子系统，对应 Linux 0.11 的
//! kernel/sched.c、kernel/fork.c、kernel/exit.c、kernel/signal.c：
//! - `sched`: 任务表、优先级衰减调度器、定时器
//! - `process`: 任务控制块、等待队列、fork/exit/wait/kill、信号处理
//! - `signal`: 信号编号、处理动作、信号帧
//! - `ipc`: 共享内存描述符表
//! - `syscall`: 系统调用入口
//!
//! 物理页分配、地址空间复制、文件/inode 层、终端和上下文切换都是外部协作者，
//! 通过 `arch::Platform`（`ContextOps + MemoryOps + FsOps`）注入。

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod arch;
pub mod config;
pub mod errno;
pub mod fs;
pub mod ipc;
pub mod mm;
pub mod process;
pub mod sched;
pub mod signal;
pub mod syscall;

#[cfg(test)]
mod tests;

pub use arch::Platform;
pub use errno::{Errno, KResult};
pub use process::task::{Pid, Task, TaskState};
pub use sched::Scheduler;
