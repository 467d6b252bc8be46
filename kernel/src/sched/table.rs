//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 任务表
//!
//! 对应 Linux 0.11 的 `struct task_struct * task[NR_TASKS]`。
//! 槽位号与 PID 无关；0 号槽位永远是 idle 任务。
//! 槽位占用情况额外用位图记录，查找空槽不必逐个解引用。

use alloc::boxed::Box;

use crate::config::NR_TASKS;
use crate::process::task::{Pid, Task};

const BITMAP_WORDS: usize = NR_TASKS.div_ceil(64);

pub struct TaskTable {
    slots: [Option<Box<Task>>; NR_TASKS],
    occupied: [u64; BITMAP_WORDS],
}

impl TaskTable {
    /// 创建任务表，`idle` 放入 0 号槽位
    pub fn new(idle: Task) -> Self {
        let mut table = Self {
            slots: core::array::from_fn(|_| None),
            occupied: [0; BITMAP_WORDS],
        };
        table.insert(0, Box::new(idle));
        table
    }

    #[inline]
    pub fn is_occupied(&self, slot: usize) -> bool {
        slot < NR_TASKS && self.occupied[slot / 64] & (1 << (slot % 64)) != 0
    }

    /// 把任务放入空槽位
    pub fn insert(&mut self, slot: usize, task: Box<Task>) -> &mut Task {
        assert!(!self.is_occupied(slot), "task slot {} already in use", slot);
        self.occupied[slot / 64] |= 1 << (slot % 64);
        self.slots[slot].insert(task)
    }

    /// 清空槽位，返回其中的任务
    pub fn remove(&mut self, slot: usize) -> Option<Box<Task>> {
        assert!(slot != 0, "idle task cannot be removed");
        if !self.is_occupied(slot) {
            return None;
        }
        self.occupied[slot / 64] &= !(1 << (slot % 64));
        self.slots[slot].take()
    }

    #[inline]
    pub fn get(&self, slot: usize) -> Option<&Task> {
        self.slots.get(slot)?.as_deref()
    }

    #[inline]
    pub fn get_mut(&mut self, slot: usize) -> Option<&mut Task> {
        self.slots.get_mut(slot)?.as_deref_mut()
    }

    /// 最小的空闲槽位，从不返回 0
    pub fn find_free(&self) -> Option<usize> {
        for (word_idx, word) in self.occupied.iter().enumerate() {
            let mut free = !word;
            if word_idx == 0 {
                free &= !1;
            }
            if free != 0 {
                let slot = word_idx * 64 + free.trailing_zeros() as usize;
                return (slot < NR_TASKS).then_some(slot);
            }
        }
        None
    }

    pub fn slot_of(&self, pid: Pid) -> Option<usize> {
        self.iter().find(|(_, t)| t.pid == pid).map(|(slot, _)| slot)
    }

    #[inline]
    pub fn pid_in_use(&self, pid: Pid) -> bool {
        self.slot_of(pid).is_some()
    }

    /// 按槽位号升序遍历已占用的槽位，`.rev()` 即从最高槽位向下扫描
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (usize, &Task)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, t)| t.as_deref().map(|t| (slot, t)))
    }

    pub fn iter_mut(&mut self) -> impl DoubleEndedIterator<Item = (usize, &mut Task)> + '_ {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(slot, t)| t.as_deref_mut().map(|t| (slot, t)))
    }

    /// 已占用槽位数（含 idle）
    pub fn nr_tasks(&self) -> usize {
        self.occupied.iter().map(|w| w.count_ones() as usize).sum()
    }
}
