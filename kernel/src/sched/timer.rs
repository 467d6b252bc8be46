//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 内核定时器
//!
//! 对应 Linux 0.11 kernel/sched.c 的 timer_list / add_timer。
//! 固定大小的请求池，按累计延迟排成单链表，每个节点只记录相对前驱的滴答数，
//! 时钟中断只需递减链表头。

use crate::config::TIME_REQUESTS;

#[derive(Clone, Copy)]
struct TimerEntry<F> {
    /// 相对前驱节点的滴答数
    jiffies: i64,
    /// 回调，`None` 表示节点空闲
    func: Option<F>,
    data: usize,
    next: Option<usize>,
}

impl<F> TimerEntry<F> {
    const fn empty() -> Self {
        Self {
            jiffies: 0,
            func: None,
            data: 0,
            next: None,
        }
    }
}

/// 定时器请求池
pub struct TimerList<F> {
    entries: [TimerEntry<F>; TIME_REQUESTS],
    head: Option<usize>,
}

impl<F: Copy> TimerList<F> {
    pub fn new() -> Self {
        Self {
            entries: core::array::from_fn(|_| TimerEntry::empty()),
            head: None,
        }
    }

    /// 插入一个 `delay` 个滴答后到期的请求
    ///
    /// 到期时刻相同的请求按插入顺序触发。池满时返回 `false`。
    pub fn add(&mut self, delay: i64, func: F, data: usize) -> bool {
        let Some(slot) = self.entries.iter().position(|e| e.func.is_none()) else {
            return false;
        };

        let mut remaining = delay;
        let mut prev = None;
        let mut cur = self.head;
        while let Some(idx) = cur {
            let entry = &self.entries[idx];
            if entry.jiffies > remaining {
                break;
            }
            remaining -= entry.jiffies;
            prev = cur;
            cur = entry.next;
        }

        if let Some(succ) = cur {
            self.entries[succ].jiffies -= remaining;
        }
        self.entries[slot] = TimerEntry {
            jiffies: remaining,
            func: Some(func),
            data,
            next: cur,
        };
        match prev {
            Some(p) => self.entries[p].next = Some(slot),
            None => self.head = Some(slot),
        }
        true
    }

    /// 时钟中断：链表头剩余滴答减一
    pub fn tick(&mut self) {
        if let Some(head) = self.head {
            self.entries[head].jiffies -= 1;
        }
    }

    /// 摘下已到期的链表头
    ///
    /// 先摘下再返回，回调里可以继续添加定时器。
    pub fn pop_expired(&mut self) -> Option<(F, usize)> {
        let head = self.head?;
        let entry = &mut self.entries[head];
        if entry.jiffies > 0 {
            return None;
        }
        self.head = entry.next.take();
        let func = entry.func.take()?;
        Some((func, entry.data))
    }

    /// 已使用的请求数
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.func.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }
}

impl<F: Copy> Default for TimerList<F> {
    fn default() -> Self {
        Self::new()
    }
}
