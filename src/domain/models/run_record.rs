// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// 检查运行记录
///
/// 每次检查尝试追加一条审计记录，只追加、不修改。
/// 诊断与退避状态推导都以此为依据，任何失败路径
/// 都不允许静默丢弃。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    /// 目标ID
    pub target_id: Uuid,
    /// 运行结果
    pub outcome: RunOutcome,
    /// 失败发生的流水线阶段（成功时为最后阶段）
    pub stage: PipelineStage,
    /// 尝试次数
    pub attempt: u32,
    /// 运行耗时（毫秒）
    pub duration_ms: u64,
    /// 错误详情
    pub error: Option<String>,
    /// 记录时间
    pub recorded_at: DateTime<Utc>,
}

impl RunRecord {
    pub fn new(target_id: Uuid, outcome: RunOutcome, stage: PipelineStage, attempt: u32) -> Self {
        Self {
            target_id,
            outcome,
            stage,
            attempt,
            duration_ms: 0,
            error: None,
            recorded_at: Utc::now(),
        }
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// 运行结果枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// 首次观测，建立基线快照
    FirstObservation,
    /// 成功且无变更
    Unchanged,
    /// 成功且检测到变更
    Changed,
    /// 抓取失败
    FetchFailed,
    /// 提取失败
    ExtractionFailed,
    /// 存储不可用
    StorageFailed,
}

impl RunOutcome {
    /// 是否为成功结果
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            RunOutcome::FirstObservation | RunOutcome::Unchanged | RunOutcome::Changed
        )
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RunOutcome::FirstObservation => write!(f, "first_observation"),
            RunOutcome::Unchanged => write!(f, "unchanged"),
            RunOutcome::Changed => write!(f, "changed"),
            RunOutcome::FetchFailed => write!(f, "fetch_failed"),
            RunOutcome::ExtractionFailed => write!(f, "extraction_failed"),
            RunOutcome::StorageFailed => write!(f, "storage_failed"),
        }
    }
}

/// 流水线阶段
///
/// 任务状态机：Received → Fetching → Extracting → Detecting
/// → (Notifying) → Committing → Acknowledged。失败转移会记录
/// 所在阶段与错误类别。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Received,
    Fetching,
    Extracting,
    Detecting,
    Notifying,
    Committing,
    Acknowledged,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            PipelineStage::Received => "received",
            PipelineStage::Fetching => "fetching",
            PipelineStage::Extracting => "extracting",
            PipelineStage::Detecting => "detecting",
            PipelineStage::Notifying => "notifying",
            PipelineStage::Committing => "committing",
            PipelineStage::Acknowledged => "acknowledged",
        };
        write!(f, "{}", s)
    }
}
