use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json,
};
use log::{info, warn};
use manual_core::{NewLab, UpdatedLab};

use crate::{
    auth::AdminSession,
    errors::ServerResult,
    schemas::{NewLabSchema, UpdatedLabSchema, ValidatedJson},
    serialized::{Lab, Message, ToSerialized},
    Router, ServerContext,
};

#[utoipa::path(
    get,
    path = "/api/labs/{topic}/{lab}",
    tag = "labs",
    params(
        ("topic" = String, Path, description = "The slug of the topic"),
        ("lab" = String, Path, description = "The slug of the lab")
    ),
    responses(
        (status = 200, body = Lab),
        (status = 404, description = "Lab not found")
    )
)]
async fn lab(
    State(context): State<ServerContext>,
    Path((topic_slug, lab_slug)): Path<(String, String)>,
) -> ServerResult<Json<Lab>> {
    let lab = context
        .manual
        .database
        .lab_by_slug(&topic_slug, &lab_slug)
        .await?;

    Ok(Json(lab.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/api/labs",
    tag = "labs",
    request_body = NewLabSchema,
    security(
        ("session" = [])
    ),
    responses(
        (status = 201, body = Lab),
        (status = 400, description = "Malformed body"),
        (status = 401, description = "Missing or expired session")
    )
)]
async fn create_lab(
    admin: AdminSession,
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<NewLabSchema>,
) -> ServerResult<(StatusCode, Json<Lab>)> {
    let lab = context
        .manual
        .database
        .create_lab(NewLab {
            topic_id: body.topic_id,
            title: body.title,
            content: body.content,
            commands: body.commands,
            difficulty: body.difficulty,
        })
        .await?;

    info!("{} created lab {}", admin.user.username, lab.slug);

    let monitor = context.manual.monitor.clone();
    let message = format!("New lab created: {}", lab.title);
    tokio::spawn(async move {
        if let Err(e) = monitor.alert(&message).await {
            warn!("Could not alert about new lab: {}", e);
        }
    });

    Ok((StatusCode::CREATED, Json(lab.to_serialized())))
}

#[utoipa::path(
    put,
    path = "/api/labs/{id}",
    tag = "labs",
    params(("id" = i32, Path, description = "The id of the lab")),
    request_body = UpdatedLabSchema,
    security(
        ("session" = [])
    ),
    responses(
        (status = 200, body = Lab),
        (status = 404, description = "Lab not found")
    )
)]
async fn update_lab(
    _admin: AdminSession,
    State(context): State<ServerContext>,
    Path(id): Path<i32>,
    ValidatedJson(body): ValidatedJson<UpdatedLabSchema>,
) -> ServerResult<Json<Lab>> {
    let lab = context
        .manual
        .database
        .update_lab(UpdatedLab {
            id,
            title: body.title,
            content: body.content,
            commands: body.commands,
            difficulty: body.difficulty,
        })
        .await?;

    Ok(Json(lab.to_serialized()))
}

#[utoipa::path(
    delete,
    path = "/api/labs/{id}",
    tag = "labs",
    params(("id" = i32, Path, description = "The id of the lab")),
    security(
        ("session" = [])
    ),
    responses(
        (status = 200, body = Message),
        (status = 404, description = "Lab not found")
    )
)]
async fn delete_lab(
    admin: AdminSession,
    State(context): State<ServerContext>,
    Path(id): Path<i32>,
) -> ServerResult<Json<Message>> {
    context.manual.database.delete_lab(id).await?;
    info!("{} deleted lab {}", admin.user.username, id);

    Ok(Json(Message::new("Deleted")))
}

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_lab))
        .route("/:id", put(update_lab).delete(delete_lab))
        .route("/:topic/:lab", get(lab))
}
