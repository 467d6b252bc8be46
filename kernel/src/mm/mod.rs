//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 内存管理接口
//!
//! 物理页分配、地址空间复制和用户内存访问由内存管理层提供，
//! 对应 Linux 0.11 mm/memory.c 的 get_free_page / free_page / copy_page_tables /
//! put_page 以及 fork.c 的 copy_mem。

use crate::errno::KResult;

/// 物理地址
pub type PhysAddr = u64;

/// 任务的代码段和数据段描述
///
/// 对应 Linux 0.11 LDT 中代码段、数据段的基址与限长。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemRegion {
    pub code_base: u64,
    pub code_limit: u64,
    pub data_base: u64,
    pub data_limit: u64,
}

/// 内存管理协作者
pub trait MemoryOps {
    /// 分配一个物理页，耗尽时返回 `None`
    fn get_free_page(&mut self) -> Option<PhysAddr>;

    /// 释放物理页
    fn free_page(&mut self, page: PhysAddr);

    /// 为槽位 `nr` 复制 `parent` 的地址空间
    ///
    /// 要么全部成功，要么不产生任何映射并返回 `OutOfMemory`。
    fn copy_mem(&mut self, nr: usize, parent: &MemRegion) -> KResult<MemRegion>;

    /// 释放任务的地址空间
    fn free_mem(&mut self, nr: usize, mem: &MemRegion);

    /// 把物理页映射到线性地址 `addr`
    fn put_page(&mut self, page: PhysAddr, addr: u64) -> KResult<()>;

    /// 向槽位 `nr` 的用户地址写入一个 32 位字
    fn put_user(&mut self, nr: usize, addr: u64, value: u32) -> KResult<()>;

    /// 从槽位 `nr` 的用户地址读取一个 32 位字
    fn get_user(&mut self, nr: usize, addr: u64) -> KResult<u32>;
}
