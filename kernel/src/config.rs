//! Rux 内核配置（自动生成）
//!
//! 此文件由 build.rs 根据 Kernel.toml 自动生成，请勿手动修改

// ============================================================
// 基本信息
// ============================================================

/// 内核名称
pub const KERNEL_NAME: &str = "Rux";

/// 内核版本
pub const KERNEL_VERSION: &str = "0.1.0";

// ============================================================
// 调度器配置
// ============================================================

/// 任务槽数量（含 0 号 idle 任务）
pub const NR_TASKS: usize = 64;

/// 每秒时钟中断次数
pub const HZ: u64 = 100;

/// 新任务的静态优先级
pub const INIT_PRIORITY: i32 = 15;

/// 定时器请求池大小
pub const TIME_REQUESTS: usize = 64;

// ============================================================
// 进程配置
// ============================================================

/// 每个进程可打开的文件数
pub const NR_OPEN: usize = 20;

// ============================================================
// 内存配置
// ============================================================

/// 页大小
pub const PAGE_SIZE: usize = 4096;

/// 页大小位移
pub const PAGE_SHIFT: usize = 12;

/// 每个任务槽的线性地址窗口大小（字节）
pub const TASK_SIZE: u64 = 67108864;

// ============================================================
// IPC 配置
// ============================================================

/// 共享内存描述符数量
pub const SHM_NUM: usize = 16;

// ============================================================
// 调试配置
// ============================================================

/// 默认日志级别
pub const LOG_LEVEL: &str = "info";
