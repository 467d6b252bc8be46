//! 共享内存测试

use super::mock::boot;
use crate::config::{PAGE_SIZE, SHM_NUM, TASK_SIZE};
use crate::errno::Errno;

#[test]
fn test_same_key_same_segment() {
    let mut sched = boot();
    let pages = sched.platform().allocated.len();

    let id = sched.sys_shmget(0x1234, 100).unwrap();
    assert_eq!(sched.sys_shmget(0x1234, 200), Ok(id));
    assert_eq!(sched.platform().allocated.len(), pages + 1);

    let seg = sched.shm.segment(id).unwrap();
    assert_eq!(seg.key, 0x1234);
    assert_eq!(seg.size, 100);
    assert_eq!(seg.page, *sched.platform().allocated.last().unwrap());

    let other = sched.sys_shmget(0x5678, PAGE_SIZE).unwrap();
    assert_ne!(other, id);
}

#[test]
fn test_shmget_rejects_bad_arguments() {
    let mut sched = boot();
    assert_eq!(
        sched.sys_shmget(0x1234, PAGE_SIZE + 1),
        Err(Errno::InvalidArgument)
    );
    assert_eq!(sched.sys_shmget(0, 16), Err(Errno::InvalidArgument));
}

#[test]
fn test_shmget_without_free_page() {
    let mut sched = boot();
    sched.platform_mut().page_budget = Some(0);
    assert_eq!(sched.sys_shmget(0x1234, 16), Err(Errno::OutOfMemory));
    // 失败后描述符仍空闲
    sched.platform_mut().page_budget = None;
    assert_eq!(sched.sys_shmget(0x1234, 16), Ok(0));
}

#[test]
fn test_shm_table_full() {
    let mut sched = boot();
    for key in 1..=SHM_NUM as u32 {
        sched.sys_shmget(key, 16).unwrap();
    }
    let pages = sched.platform().allocated.len();
    assert_eq!(
        sched.sys_shmget(SHM_NUM as u32 + 1, 16),
        Err(Errno::NoSpaceLeftOnDevice)
    );
    assert_eq!(sched.platform().allocated.len(), pages);
    // 已有的 key 仍然可以获取
    assert_eq!(sched.sys_shmget(3, 16), Ok(2));
}

#[test]
fn test_shmat_maps_at_brk() {
    let mut sched = boot();
    sched.current_mut().brk = 0x3000;
    let id = sched.sys_shmget(0x42, 64).unwrap();
    let page = sched.shm.segment(id).unwrap().page;

    assert_eq!(sched.sys_shmat(id as i32), Ok(0x3000));
    assert_eq!(sched.current().brk, 0x3000 + PAGE_SIZE as u64);
    assert_eq!(sched.platform().mapped, [(page, TASK_SIZE + 0x3000)]);

    // 再次 attach 映射到下一页
    assert_eq!(sched.sys_shmat(id as i32), Ok(0x3000 + PAGE_SIZE as u64));
    assert_eq!(sched.current().brk, 0x3000 + 2 * PAGE_SIZE as u64);
}

#[test]
fn test_shmat_invalid_id() {
    let mut sched = boot();
    assert_eq!(sched.sys_shmat(0), Err(Errno::InvalidArgument));
    assert_eq!(sched.sys_shmat(-1), Err(Errno::InvalidArgument));
    assert_eq!(sched.sys_shmat(SHM_NUM as i32), Err(Errno::InvalidArgument));
    assert_eq!(sched.current().brk, 0);
    assert!(sched.platform().mapped.is_empty());
}
