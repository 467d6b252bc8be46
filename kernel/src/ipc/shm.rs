//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 共享内存
//!
//! 最多 `SHM_NUM` 个描述符，每个最多一页。按 key 获取或创建，
//! attach 时把物理页映射到调用者的堆顶并把堆顶上移一页。

use log::warn;
use spin::Mutex;

use crate::arch::Platform;
use crate::config::{PAGE_SIZE, SHM_NUM};
use crate::errno::{Errno, KResult};
use crate::mm::{MemoryOps, PhysAddr};
use crate::sched::Scheduler;

/// 共享内存描述符，`key == 0` 表示空闲
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShmSegment {
    pub key: u32,
    pub size: usize,
    pub page: PhysAddr,
}

pub struct ShmTable {
    segments: Mutex<[ShmSegment; SHM_NUM]>,
}

impl ShmTable {
    pub const fn new() -> Self {
        Self {
            segments: Mutex::new(
                [ShmSegment {
                    key: 0,
                    size: 0,
                    page: 0,
                }; SHM_NUM],
            ),
        }
    }

    /// 按 key 获取描述符，不存在则分配一页创建
    pub fn get(&self, key: u32, size: usize, mm: &mut impl MemoryOps) -> KResult<usize> {
        if size > PAGE_SIZE {
            warn!("shmget: size {} exceeds one page", size);
            return Err(Errno::InvalidArgument);
        }
        if key == 0 {
            warn!("shmget: key must not be 0");
            return Err(Errno::InvalidArgument);
        }

        let mut segments = self.segments.lock();
        if let Some(id) = segments.iter().position(|s| s.key == key) {
            return Ok(id);
        }
        let Some(id) = segments.iter().position(|s| s.key == 0) else {
            return Err(Errno::NoSpaceLeftOnDevice);
        };
        let Some(page) = mm.get_free_page() else {
            warn!("shmget: no free page");
            return Err(Errno::OutOfMemory);
        };
        segments[id] = ShmSegment { key, size, page };
        Ok(id)
    }

    /// 已分配描述符的物理页
    pub fn page(&self, id: i32) -> KResult<PhysAddr> {
        let segments = self.segments.lock();
        match usize::try_from(id).ok().and_then(|id| segments.get(id)) {
            Some(seg) if seg.key != 0 && seg.page != 0 => Ok(seg.page),
            _ => Err(Errno::InvalidArgument),
        }
    }

    pub fn segment(&self, id: usize) -> Option<ShmSegment> {
        self.segments.lock().get(id).copied().filter(|s| s.key != 0)
    }
}

impl Default for ShmTable {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Platform> Scheduler<P> {
    /// shmget 系统调用，返回描述符编号
    pub fn sys_shmget(&mut self, key: u32, size: usize) -> KResult<usize> {
        self.shm.get(key, size, &mut self.platform)
    }

    /// shmat 系统调用
    ///
    /// 映射到 `code_base + brk`，返回映射前的 brk（逻辑地址）
    pub fn sys_shmat(&mut self, id: i32) -> KResult<u64> {
        let page = self.shm.page(id)?;
        let (base, brk) = {
            let task = self.current();
            (task.mem.code_base, task.brk)
        };
        self.platform.put_page(page, base + brk)?;
        self.current_mut().brk += PAGE_SIZE as u64;
        Ok(brk)
    }
}
