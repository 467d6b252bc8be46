//! Rux 进程子系统构建脚本
//!
//! 这个脚本在编译前运行，负责：
//! 1. 解析 Kernel.toml（或 menuconfig 生成的 build/.config）
//! 2. 生成 src/config.rs
//! 3. 导出日志级别等编译期环境变量

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;

/// 解析 build/.config 文件（简单 key=value 格式）
fn parse_dot_config(content: &str) -> toml::Value {
    let mut sections: HashMap<String, toml::map::Map<String, toml::Value>> = HashMap::new();

    for line in content.lines() {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        // section_key=value，section 与 key 以第一个下划线分割
        if let Some((key, value)) = line.split_once('=') {
            let value = value.trim();
            if let Some((section, config_key)) = key.split_once('_') {
                let parsed_value = if value == "true" {
                    toml::Value::Boolean(true)
                } else if value == "false" {
                    toml::Value::Boolean(false)
                } else if let Ok(int_val) = value.parse::<i64>() {
                    toml::Value::Integer(int_val)
                } else {
                    toml::Value::String(value.trim_matches('"').to_string())
                };

                sections
                    .entry(section.to_string())
                    .or_default()
                    .insert(config_key.to_string(), parsed_value);
            }
        }
    }

    let mut root_map = toml::map::Map::new();
    for (section_name, section_data) in sections {
        root_map.insert(section_name, toml::Value::Table(section_data));
    }
    toml::Value::Table(root_map)
}

fn get_int(config: &toml::Value, section: &str, key: &str, default: i64) -> i64 {
    config
        .get(section)
        .and_then(|s| s.get(key))
        .and_then(|v| v.as_integer())
        .unwrap_or(default)
}

fn get_str<'a>(config: &'a toml::Value, section: &str, key: &str, default: &'a str) -> &'a str {
    config
        .get(section)
        .and_then(|s| s.get(key))
        .and_then(|v| v.as_str())
        .unwrap_or(default)
}

fn main() {
    println!("cargo:rerun-if-changed=../Kernel.toml");
    println!("cargo:rerun-if-changed=../build/.config");

    // 优先使用 build/.config（menuconfig 生成的配置），其次 Kernel.toml，都没有则用默认值
    let config = if let Ok(content) = fs::read_to_string("../build/.config") {
        println!("cargo:warning=Using build/.config configuration");
        parse_dot_config(&content)
    } else if let Ok(content) = fs::read_to_string("../Kernel.toml") {
        toml::from_str(&content).expect("Kernel.toml 解析失败")
    } else {
        toml::Value::Table(toml::map::Map::new())
    };

    let log_level = get_str(&config, "debug", "log_level", "info");
    println!("cargo:rustc-env=RUX_LOG_LEVEL={}", log_level);

    generate_config_code(&config);
}

fn generate_config_code(config: &toml::Value) {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());

    let page_size = get_int(config, "memory", "page_size", 4096);

    let config_header = format!(
        r#"//! Rux 内核配置（自动生成）
//!
//! 此文件由 build.rs 根据 Kernel.toml 自动生成，请勿手动修改

// ============================================================
// 基本信息
// ============================================================

/// 内核名称
pub const KERNEL_NAME: &str = "{}";

/// 内核版本
pub const KERNEL_VERSION: &str = "{}";

// ============================================================
// 调度器配置
// ============================================================

/// 任务槽数量（含 0 号 idle 任务）
pub const NR_TASKS: usize = {};

/// 每秒时钟中断次数
pub const HZ: u64 = {};

/// 新任务的静态优先级
pub const INIT_PRIORITY: i32 = {};

/// 定时器请求池大小
pub const TIME_REQUESTS: usize = {};

// ============================================================
// 进程配置
// ============================================================

/// 每个进程可打开的文件数
pub const NR_OPEN: usize = {};

// ============================================================
// 内存配置
// ============================================================

/// 页大小
pub const PAGE_SIZE: usize = {};

/// 页大小位移
pub const PAGE_SHIFT: usize = {};

/// 每个任务槽的线性地址窗口大小（字节）
pub const TASK_SIZE: u64 = {};

// ============================================================
// IPC 配置
// ============================================================

/// 共享内存描述符数量
pub const SHM_NUM: usize = {};

// ============================================================
// 调试配置
// ============================================================

/// 默认日志级别
pub const LOG_LEVEL: &str = "{}";
"#,
        get_str(config, "general", "name", "Rux"),
        get_str(config, "general", "version", "0.1.0"),
        get_int(config, "scheduler", "nr_tasks", 64),
        get_int(config, "scheduler", "hz", 100),
        get_int(config, "scheduler", "init_priority", 15),
        get_int(config, "scheduler", "time_requests", 64),
        get_int(config, "process", "nr_open", 20),
        page_size,
        page_size.trailing_zeros(),
        get_int(config, "memory", "task_size", 64) * 1024 * 1024,
        get_int(config, "ipc", "shm_num", 16),
        get_str(config, "debug", "log_level", "info"),
    );

    let config_file = manifest_dir.join("src").join("config.rs");

    // 只有内容变化时才写入，避免每次编译都更新文件时间戳
    let existing_content = fs::read_to_string(&config_file).unwrap_or_default();
    if existing_content != config_header {
        fs::write(&config_file, &config_header).expect("写入配置文件失败");
    }
}
