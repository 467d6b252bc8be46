//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 调度器模块
//!
//! 遵循 Linux 0.11 的调度器设计 (kernel/sched.c)：
//! - 固定大小的任务表，0 号槽位是 idle 任务
//! - 按剩余时间片 (counter) 选择，全部用完时按优先级衰减重算
//! - 时钟中断只在用户态且时间片耗尽时触发调度
//! - 内核定时器按累计延迟排序

pub mod pid;
pub mod sched;
pub mod table;
pub mod timer;

pub use pid::PidAllocator;
pub use sched::{Scheduler, TimerFn};
pub use table::TaskTable;
pub use timer::TimerList;
