//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 架构相关抽象
//!
//! 进程核心不直接操作寄存器，上下文保存/切换由体系结构层实现 `ContextOps`。
//! 寄存器布局属于外部 ABI，这里只保留调度和信号投递需要读写的字段。

pub mod context;

pub use context::{ContextOps, CpuContext, FpuState};

use crate::fs::FsOps;
use crate::mm::MemoryOps;

/// 进程核心依赖的全部外部能力
///
/// 体系结构层、内存管理和文件系统各自实现一部分，
/// 只要同时实现三者即自动满足 `Platform`。
pub trait Platform: ContextOps + MemoryOps + FsOps {}

impl<T: ContextOps + MemoryOps + FsOps> Platform for T {}
