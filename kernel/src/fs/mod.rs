//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 文件系统接口
//!
//! 进程核心只持有文件和 inode 的引用句柄，引用计数和关闭动作由文件系统层完成。

/// 打开文件的引用
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileRef(pub u32);

/// inode 引用
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InodeRef(pub u32);

/// 文件系统协作者
pub trait FsOps {
    /// 增加文件引用计数（fork 继承）
    fn file_dup(&mut self, file: FileRef);

    /// 关闭描述符 `fd`
    fn close(&mut self, fd: usize, file: FileRef);

    /// 增加 inode 引用计数
    fn inode_dup(&mut self, inode: InodeRef);

    /// 释放 inode 引用
    fn iput(&mut self, inode: InodeRef);

    /// 会话首领退出时解除终端的进程组
    fn tty_detach(&mut self, tty: u32);
}
