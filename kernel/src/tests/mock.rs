//! 测试用的平台实现
//!
//! 记录对内存、文件系统和上下文切换协作者的每一次调用。

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::arch::{ContextOps, CpuContext, FpuState};
use crate::config::{PAGE_SIZE, TASK_SIZE};
use crate::errno::{Errno, KResult};
use crate::fs::{FileRef, FsOps, InodeRef};
use crate::mm::{MemRegion, MemoryOps, PhysAddr};
use crate::process::task::Pid;
use crate::sched::Scheduler;

pub type Sched = Scheduler<MockPlatform>;

/// 第一个物理页地址
pub const PAGE_BASE: PhysAddr = 0x10_0000;

#[derive(Default)]
pub struct MockPlatform {
    next_page: PhysAddr,
    /// 还能分配的页数，`None` 表示不限
    pub page_budget: Option<usize>,
    pub allocated: Vec<PhysAddr>,
    pub freed: Vec<PhysAddr>,
    pub fail_copy_mem: bool,
    pub copied: Vec<usize>,
    pub freed_mem: Vec<usize>,
    pub mapped: Vec<(PhysAddr, u64)>,
    pub user_mem: BTreeMap<(usize, u64), u32>,
    pub file_dups: Vec<FileRef>,
    pub closed: Vec<(usize, FileRef)>,
    pub inode_dups: Vec<InodeRef>,
    pub iputs: Vec<InodeRef>,
    pub tty_detached: Vec<u32>,
    /// (prev.kernel_sp, next.kernel_sp)
    pub switches: Vec<(u64, u64)>,
    /// 模拟的浮点寄存器
    pub live_fpu: FpuState,
    pub fpu_saves: usize,
    pub fpu_restores: usize,
    pub fpu_inits: usize,
    /// 定时器回调记录 (jiffies, data)
    pub fired: Vec<(u64, usize)>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self {
            next_page: PAGE_BASE,
            ..Self::default()
        }
    }

    pub fn pages_in_use(&self) -> usize {
        self.allocated.len() - self.freed.len()
    }
}

impl ContextOps for MockPlatform {
    fn save_fpu(&mut self, state: &mut FpuState) {
        *state = self.live_fpu;
        self.fpu_saves += 1;
    }

    fn restore_fpu(&mut self, state: &FpuState) {
        self.live_fpu = *state;
        self.fpu_restores += 1;
    }

    fn init_fpu(&mut self) {
        self.live_fpu = FpuState::default();
        self.fpu_inits += 1;
    }

    fn switch_to(&mut self, prev: &mut CpuContext, next: &CpuContext) {
        self.switches.push((prev.kernel_sp, next.kernel_sp));
    }
}

impl MemoryOps for MockPlatform {
    fn get_free_page(&mut self) -> Option<PhysAddr> {
        if let Some(budget) = self.page_budget.as_mut() {
            if *budget == 0 {
                return None;
            }
            *budget -= 1;
        }
        let page = self.next_page;
        self.next_page += PAGE_SIZE as u64;
        self.allocated.push(page);
        Some(page)
    }

    fn free_page(&mut self, page: PhysAddr) {
        self.freed.push(page);
    }

    fn copy_mem(&mut self, nr: usize, parent: &MemRegion) -> KResult<MemRegion> {
        if self.fail_copy_mem {
            return Err(Errno::OutOfMemory);
        }
        self.copied.push(nr);
        let base = nr as u64 * TASK_SIZE;
        Ok(MemRegion {
            code_base: base,
            code_limit: parent.code_limit,
            data_base: base,
            data_limit: parent.data_limit,
        })
    }

    fn free_mem(&mut self, nr: usize, _mem: &MemRegion) {
        self.freed_mem.push(nr);
    }

    fn put_page(&mut self, page: PhysAddr, addr: u64) -> KResult<()> {
        self.mapped.push((page, addr));
        Ok(())
    }

    fn put_user(&mut self, nr: usize, addr: u64, value: u32) -> KResult<()> {
        if addr >= TASK_SIZE {
            return Err(Errno::BadAddress);
        }
        self.user_mem.insert((nr, addr), value);
        Ok(())
    }

    fn get_user(&mut self, nr: usize, addr: u64) -> KResult<u32> {
        if addr >= TASK_SIZE {
            return Err(Errno::BadAddress);
        }
        Ok(self.user_mem.get(&(nr, addr)).copied().unwrap_or(0))
    }
}

impl FsOps for MockPlatform {
    fn file_dup(&mut self, file: FileRef) {
        self.file_dups.push(file);
    }

    fn close(&mut self, fd: usize, file: FileRef) {
        self.closed.push((fd, file));
    }

    fn inode_dup(&mut self, inode: InodeRef) {
        self.inode_dups.push(inode);
    }

    fn iput(&mut self, inode: InodeRef) {
        self.iputs.push(inode);
    }

    fn tty_detach(&mut self, tty: u32) {
        self.tty_detached.push(tty);
    }
}

/// 只有 idle 任务的调度器
pub fn bare() -> Sched {
    Scheduler::new(MockPlatform::new())
}

/// idle 派生出 init（PID 1，1 号槽位）并切换过去
pub fn boot() -> Sched {
    let mut sched = bare();
    let pid = sched.sys_fork().unwrap();
    assert_eq!(pid, 1);
    sched.schedule();
    assert_eq!(sched.current_slot(), 1);
    sched
}

pub fn slot_of(sched: &Sched, pid: Pid) -> usize {
    sched.tasks.slot_of(pid).unwrap()
}

/// 直接把 `pid` 设为当前任务
pub fn run_as(sched: &mut Sched, pid: Pid) {
    sched.current = slot_of(sched, pid);
}

/// 当前任务 fork 一个子进程，返回 (pid, slot)
pub fn spawn(sched: &mut Sched) -> (Pid, usize) {
    let pid = sched.sys_fork().unwrap();
    (pid, slot_of(sched, pid))
}
