//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! CPU 上下文
//!
//! 对应 Linux 的 struct thread_struct / struct tss_struct。
//! 陷入内核时保存的用户态寄存器快照；系统调用返回值写入 `x0`，
//! 信号投递改写 `pc` 和 `sp`。

use crate::mm::PhysAddr;

/// 任务保存的执行上下文
#[repr(C)]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CpuContext {
    /// 返回值 / 第一个参数寄存器
    pub x0: u64,
    pub x1: u64,
    pub x2: u64,
    /// 用户栈指针
    pub sp: u64,
    /// 返回用户态后继续执行的地址
    pub pc: u64,
    /// 处理器状态（标志位）
    pub pstate: u64,
    /// 内核栈顶
    pub kernel_sp: u64,
}

/// 浮点寄存器保存区
///
/// 对应 Linux 0.11 的 struct i387_struct
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FpuState {
    pub data: [u64; 16],
}

/// 硬件上下文能力
///
/// 对应 arch/riscv64/context.rs 的 `cpu_switch_to` / `context_switch`，
/// 以及 Linux 0.11 的 `switch_to` 宏和 `math_state_restore` 中的 fnsave/frstor。
pub trait ContextOps {
    /// 把当前浮点寄存器保存到 `state`
    fn save_fpu(&mut self, state: &mut FpuState);

    /// 从 `state` 恢复浮点寄存器
    fn restore_fpu(&mut self, state: &FpuState);

    /// 初始化浮点单元（任务第一次使用浮点）
    fn init_fpu(&mut self);

    /// 构造子进程的初始上下文
    ///
    /// 子进程第一次被调度时在用户态从 fork 调用点继续执行，返回值为 0。
    /// `kernel_stack` 是为子进程分配的内核栈页。
    fn construct_initial(&mut self, parent: &CpuContext, kernel_stack: PhysAddr) -> CpuContext {
        let mut ctx = parent.clone();
        ctx.x0 = 0;
        ctx.kernel_sp = kernel_stack + crate::config::PAGE_SIZE as u64;
        ctx
    }

    /// 保存 `prev` 并切换到 `next`
    ///
    /// 这是内核唯一的挂起点，由调度器在选出的任务与前一个任务不同时调用。
    fn switch_to(&mut self, prev: &mut CpuContext, next: &CpuContext);
}
