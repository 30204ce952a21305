use axum::Json;
use axum::extract::{OriginalUri, Query, State};
use sea_orm::*;
use tracing::instrument;

use crate::entity::video;
use crate::error::AppError;
use crate::listing::{DatatableParams, ListQuery};
use crate::models::envelope::{DataEnvelope, Datatable, MessageEnvelope, ok};
use crate::models::video::{VIDEO_LISTING, VideoResponse};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/video/all",
    tag = "Videos",
    operation_id = "listVideos",
    summary = "List every video",
    params(DatatableParams),
    responses(
        (status = 200, description = "Videos", body = [VideoResponse]),
        (status = 400, description = "Unknown sort column", body = MessageEnvelope),
    ),
)]
#[instrument(skip(state, params))]
pub async fn list_videos(
    State(state): State<AppState>,
    Query(params): Query<DatatableParams>,
) -> Result<Json<DataEnvelope<Vec<VideoResponse>>>, AppError> {
    let videos = ListQuery::from_params(&params)
        .fetch_all(&state.db, video::Entity::find(), &VIDEO_LISTING)
        .await?;
    Ok(ok(videos.into_iter().map(VideoResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/video/datatable",
    tag = "Videos",
    operation_id = "videoDatatable",
    summary = "Search, sort and page through videos",
    description = "Searches video titles and embeds. Sortable by `video_title` and `created_at`.",
    params(DatatableParams),
    responses(
        (status = 200, description = "Paginated videos", body = [VideoResponse]),
        (status = 400, description = "Unknown sort column", body = MessageEnvelope),
    ),
)]
#[instrument(skip(state, uri, params))]
pub async fn video_datatable(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<DatatableParams>,
) -> Result<Json<DataEnvelope<Datatable<VideoResponse>>>, AppError> {
    let page = ListQuery::from_params(&params)
        .fetch(&state.db, video::Entity::find(), &VIDEO_LISTING)
        .await?;
    Ok(ok(Datatable::from_page(page, &uri, VideoResponse::from)))
}
