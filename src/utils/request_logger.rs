//! 上游请求日志记录器
//!
//! 记录所有 Gemini 生成请求到 JSONL 文件，便于排查回退到本地增强的原因。

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;
use uuid::Uuid;

use crate::llm::GenerationOptions;

/// 请求日志条目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// 请求 ID
    pub request_id: String,
    /// 时间戳
    pub timestamp: DateTime<Utc>,
    /// 端点 URL
    pub endpoint: String,
    /// 基础 URL
    pub base_url: String,
    /// API 密钥（脱敏）
    pub api_key_masked: String,
    /// 模型名称
    pub model: String,
    /// 指令预览
    pub prompt_preview: String,
    pub temperature: f64,
    pub top_k: u32,
    pub top_p: f64,
    pub max_output_tokens: u32,
    /// 超时时间（秒）
    pub timeout: u64,
    /// 状态：pending / success / error
    pub status: String,
    /// 持续时间（毫秒）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// 响应长度
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_length: Option<usize>,
    /// 响应预览
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_preview: Option<String>,
    /// 错误类型
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// 错误信息
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// HTTP 状态码
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

/// 打开的日志文件及其当前行数
#[derive(Default)]
struct LogFile {
    file: Option<File>,
    lines: usize,
}

/// 请求日志记录器
///
/// 写入是阻塞 IO，异步路径上通过 [`RequestLogger::record`] 放到阻塞线程池执行
pub struct RequestLogger {
    log_path: PathBuf,
    max_entries: usize,
    file: Mutex<LogFile>,
}

impl RequestLogger {
    /// 在指定目录下创建日志记录器
    pub fn new(log_dir: &Path) -> Self {
        // 确保目录存在
        let _ = fs::create_dir_all(log_dir);

        Self {
            log_path: log_dir.join("llm_requests.jsonl"),
            max_entries: 1000,
            file: Mutex::new(LogFile::default()),
        }
    }

    /// 日志文件路径
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// 生成请求 ID
    pub fn generate_request_id() -> String {
        Uuid::new_v4().to_string()[..8].to_string()
    }

    /// API 密钥脱敏
    pub fn mask_api_key(api_key: &str) -> String {
        let chars: Vec<char> = api_key.chars().collect();
        if chars.len() <= 8 {
            "*".repeat(chars.len())
        } else {
            let head: String = chars[..4].iter().collect();
            let tail: String = chars[chars.len() - 4..].iter().collect();
            format!("{}...{}", head, tail)
        }
    }

    /// 按字符截断字符串
    fn truncate(s: &str, max_chars: usize) -> String {
        match s.char_indices().nth(max_chars) {
            None => s.to_string(),
            Some((idx, _)) => format!("{}...", &s[..idx]),
        }
    }

    /// 记录请求开始
    #[allow(clippy::too_many_arguments)]
    pub fn log_request(
        &self,
        request_id: &str,
        endpoint: &str,
        model: &str,
        prompt: &str,
        options: &GenerationOptions,
        timeout: u64,
        base_url: &str,
        api_key: &str,
    ) -> LogEntry {
        LogEntry {
            request_id: request_id.to_string(),
            timestamp: Utc::now(),
            endpoint: endpoint.to_string(),
            base_url: base_url.to_string(),
            api_key_masked: Self::mask_api_key(api_key),
            model: model.to_string(),
            prompt_preview: Self::truncate(prompt, 200),
            temperature: options.temperature,
            top_k: options.top_k,
            top_p: options.top_p,
            max_output_tokens: options.max_output_tokens,
            timeout,
            status: "pending".to_string(),
            duration_ms: None,
            response_length: None,
            response_preview: None,
            error_type: None,
            error_message: None,
            status_code: None,
        }
    }

    /// 标记为成功
    pub fn finish_success(mut entry: LogEntry, start_time: Instant, response: &str) -> LogEntry {
        entry.status = "success".to_string();
        entry.duration_ms = Some(start_time.elapsed().as_millis() as u64);
        entry.response_length = Some(response.len());
        entry.response_preview = Some(Self::truncate(response, 300));
        entry
    }

    /// 标记为失败
    pub fn finish_error(
        mut entry: LogEntry,
        start_time: Instant,
        error_type: &str,
        error_message: &str,
        status_code: Option<u16>,
    ) -> LogEntry {
        entry.status = "error".to_string();
        entry.duration_ms = Some(start_time.elapsed().as_millis() as u64);
        entry.error_type = Some(error_type.to_string());
        entry.error_message = Some(Self::truncate(error_message, 500));
        entry.status_code = status_code;
        entry
    }

    /// 在阻塞线程池中写入条目
    pub async fn record(self: &Arc<Self>, entry: LogEntry) {
        let logger = Arc::clone(self);
        if let Err(e) = tokio::task::spawn_blocking(move || logger.write_entry(&entry)).await {
            warn!("Failed to write request log entry: {}", e);
        }
    }

    /// 写入日志条目（阻塞）
    pub fn write_entry(&self, entry: &LogEntry) {
        let Ok(json) = serde_json::to_string(entry) else {
            return;
        };
        let mut log = self.file.lock();

        // 懒加载文件，只在打开时统计一次已有行数
        if log.file.is_none() {
            log.lines = self.count_lines();
            log.file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.log_path)
                .ok();
        }

        let Some(file) = log.file.as_mut() else {
            return;
        };
        if writeln!(file, "{}", json).is_err() {
            return;
        }
        let _ = file.flush();
        log.lines += 1;

        // 超出上限 10% 后才截断，截断后重新打开追加句柄
        if log.lines > self.max_entries + self.max_entries / 10 {
            log.file = None;
            log.lines = self.truncate_to_latest();
        }
    }

    fn count_lines(&self) -> usize {
        File::open(&self.log_path)
            .map(|f| BufReader::new(f).lines().count())
            .unwrap_or(0)
    }

    /// 只保留最新的 max_entries 行，返回保留的行数
    fn truncate_to_latest(&self) -> usize {
        let Ok(file) = File::open(&self.log_path) else {
            return 0;
        };
        let lines: Vec<String> = BufReader::new(file).lines().map_while(Result::ok).collect();
        let keep_lines = &lines[lines.len().saturating_sub(self.max_entries)..];

        match File::create(&self.log_path) {
            Ok(mut file) => {
                for line in keep_lines {
                    let _ = writeln!(file, "{}", line);
                }
                keep_lines.len()
            }
            Err(_) => lines.len(),
        }
    }
}
