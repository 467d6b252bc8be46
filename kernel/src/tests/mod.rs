//! 进程子系统场景测试
//!
//! 通过 `mock::MockPlatform` 驱动 `Scheduler`，覆盖调度、fork、exit/wait、
//! 信号、等待队列、定时器、共享内存和系统调用入口。
//!
//! 运行测试：
//! ```bash
//! cargo test --package rux-proc
//! ```

pub mod mock;

mod shm;
mod timer;
mod wait4;
