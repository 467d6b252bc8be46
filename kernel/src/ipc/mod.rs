//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 进程间通信

pub mod shm;

pub use shm::ShmTable;
