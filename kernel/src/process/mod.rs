//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 进程管理模块
//!
//! 本模块实现进程管理功能，遵循 Linux 0.11 的进程模型：
//! - `task`: 进程控制块 (task_struct)
//! - `wait`: 等待队列 (sleep_on / wake_up)
//! - `fork`: 进程创建
//! - `exit`: 进程退出、回收、kill
//! - `signal`: 信号处理动作的安装和投递

pub mod exit;
pub mod fork;
pub mod signal;
pub mod task;
pub mod wait;

pub use exit::{Wait, WaitOptions};
pub use task::{Pid, Task, TaskState, INIT_PID};
pub use wait::{Resume, WaitQueue};
