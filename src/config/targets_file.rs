// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::commands::CommandService;
use crate::domain::repositories::state_store::StateStore;
use crate::domain::repositories::target_repository::TargetRepository;
use crate::queue::work_queue::WorkQueue;
use anyhow::Context;
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

use crate::application::dto::target_request::RegisterTargetDto;

/// 声明式目标引导文件
///
/// 与HTTP注册接口共用同一DTO结构，启动时通过命令服务
/// 逐条注册，单条失败不中断其余条目。
#[derive(Debug, Deserialize)]
pub struct TargetsFile {
    pub targets: Vec<RegisterTargetDto>,
}

/// 从YAML文件引导注册目标，返回成功注册的条数
pub async fn bootstrap_targets<R, S, Q>(
    path: impl AsRef<Path>,
    commands: &CommandService<R, S, Q>,
) -> anyhow::Result<usize>
where
    R: TargetRepository + Send + Sync,
    S: StateStore + Send + Sync,
    Q: WorkQueue + Send + Sync,
{
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read targets file {}", path.display()))?;
    let file: TargetsFile = serde_yaml::from_str(&raw)
        .with_context(|| format!("failed to parse targets file {}", path.display()))?;

    let mut registered = 0;
    for dto in file.targets {
        let name = dto.name.clone();
        match commands.register_target(dto).await {
            Ok(target_id) => {
                info!(%target_id, name = %name, "bootstrapped target from file");
                registered += 1;
            }
            Err(e) => {
                warn!(name = %name, error = %e, "skipping invalid target entry");
            }
        }
    }
    Ok(registered)
}
