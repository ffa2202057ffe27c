// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use axum::{
    extract::{Extension, Json, Path, Query},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::commands::CommandService;
use crate::application::dto::target_request::RegisterTargetDto;
use crate::application::dto::target_response::RegisterTargetResponseDto;
use crate::domain::repositories::state_store::StateStore;
use crate::domain::repositories::target_repository::TargetRepository;
use crate::presentation::errors::AppError;
use crate::queue::work_queue::WorkQueue;

#[derive(Debug, Deserialize)]
pub struct RunsQuery {
    /// 返回的运行记录条数上限
    pub limit: Option<usize>,
}

/// 注册监控目标
pub async fn register_target<R, S, Q>(
    Extension(commands): Extension<Arc<CommandService<R, S, Q>>>,
    Json(payload): Json<RegisterTargetDto>,
) -> Result<impl IntoResponse, AppError>
where
    R: TargetRepository + Send + Sync,
    S: StateStore + Send + Sync,
    Q: WorkQueue + Send + Sync,
{
    let target_id = commands.register_target(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterTargetResponseDto { target_id }),
    ))
}

/// 触发强制检查
pub async fn force_check<R, S, Q>(
    Extension(commands): Extension<Arc<CommandService<R, S, Q>>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    R: TargetRepository + Send + Sync,
    S: StateStore + Send + Sync,
    Q: WorkQueue + Send + Sync,
{
    commands.force_check(id).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "enqueued": true })),
    ))
}

/// 读取目标状态
pub async fn get_status<R, S, Q>(
    Extension(commands): Extension<Arc<CommandService<R, S, Q>>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    R: TargetRepository + Send + Sync,
    S: StateStore + Send + Sync,
    Q: WorkQueue + Send + Sync,
{
    let status = commands.get_status(id).await?;
    Ok(Json(status))
}

/// 读取目标最近的运行记录
pub async fn list_runs<R, S, Q>(
    Extension(commands): Extension<Arc<CommandService<R, S, Q>>>,
    Path(id): Path<Uuid>,
    Query(query): Query<RunsQuery>,
) -> Result<impl IntoResponse, AppError>
where
    R: TargetRepository + Send + Sync,
    S: StateStore + Send + Sync,
    Q: WorkQueue + Send + Sync,
{
    let limit = query.limit.unwrap_or(20).min(100);
    let runs = commands.list_runs(id, limit).await?;
    Ok(Json(runs))
}
