use crate::middlewares::current_user_id;
use crate::models::*;
use crate::services::GroupService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/groups",
    tag = "group",
    request_body = CreateGroupRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Group created", body = GroupResponse),
        (status = 409, description = "Name already used")
    )
)]
pub async fn create_group(
    group_service: web::Data<GroupService>,
    req: HttpRequest,
    request: web::Json<CreateGroupRequest>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;

    match group_service.create(user_id, request.into_inner()).await {
        Ok(group) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": group
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/groups/public",
    tag = "group",
    params(GroupQuery),
    responses(
        (status = 200, description = "Active public groups")
    )
)]
pub async fn list_public_groups(
    group_service: web::Data<GroupService>,
    query: web::Query<GroupQuery>,
) -> Result<HttpResponse> {
    match group_service.list_public(&query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/groups/mine",
    tag = "group",
    params(GroupQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Groups the caller belongs to")
    )
)]
pub async fn list_my_groups(
    group_service: web::Data<GroupService>,
    req: HttpRequest,
    query: web::Query<GroupQuery>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;

    match group_service.list_mine(user_id, &query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/groups/{id}",
    tag = "group",
    params(("id" = i32, Path, description = "Group id")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Group with member and khatma counts", body = GroupDetailResponse),
        (status = 403, description = "Private group"),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_group(
    group_service: web::Data<GroupService>,
    req: HttpRequest,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;

    match group_service.get(user_id, path.into_inner()).await {
        Ok(detail) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": detail
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/groups/{id}",
    tag = "group",
    params(("id" = i32, Path, description = "Group id")),
    request_body = UpdateGroupRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Group updated", body = GroupResponse),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn update_group(
    group_service: web::Data<GroupService>,
    req: HttpRequest,
    path: web::Path<i32>,
    request: web::Json<UpdateGroupRequest>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;

    match group_service
        .update(user_id, path.into_inner(), request.into_inner())
        .await
    {
        Ok(group) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": group
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/groups/{id}",
    tag = "group",
    params(("id" = i32, Path, description = "Group id")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Group deleted"),
        (status = 403, description = "Not the creator")
    )
)]
pub async fn delete_group(
    group_service: web::Data<GroupService>,
    req: HttpRequest,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;

    match group_service.delete(user_id, path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Group deleted"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/groups/{id}/join",
    tag = "group",
    params(("id" = i32, Path, description = "Group id")),
    request_body = JoinGroupRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Joined, or join request pending", body = JoinGroupResponse),
        (status = 403, description = "Group does not accept join requests"),
        (status = 409, description = "Already a member or request pending")
    )
)]
pub async fn join_group(
    group_service: web::Data<GroupService>,
    req: HttpRequest,
    path: web::Path<i32>,
    request: Option<web::Json<JoinGroupRequest>>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    let request = request.map(web::Json::into_inner).unwrap_or_default();

    match group_service
        .join(user_id, path.into_inner(), request)
        .await
    {
        Ok(outcome) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": outcome
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/groups/{id}/leave",
    tag = "group",
    params(("id" = i32, Path, description = "Group id")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Left the group"),
        (status = 400, description = "The creator cannot leave")
    )
)]
pub async fn leave_group(
    group_service: web::Data<GroupService>,
    req: HttpRequest,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;

    match group_service.leave(user_id, path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Left the group"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/groups/{id}/members",
    tag = "group",
    params(("id" = i32, Path, description = "Group id")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Members", body = [MemberResponse]),
        (status = 403, description = "Private group")
    )
)]
pub async fn list_members(
    group_service: web::Data<GroupService>,
    req: HttpRequest,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;

    match group_service.members(user_id, path.into_inner()).await {
        Ok(members) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": members
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/groups/{id}/members/{user_id}/role",
    tag = "group",
    params(
        ("id" = i32, Path, description = "Group id"),
        ("user_id" = i32, Path, description = "Member")
    ),
    request_body = ChangeRoleRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Role changed", body = MemberResponse),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn change_role(
    group_service: web::Data<GroupService>,
    req: HttpRequest,
    path: web::Path<(i32, i32)>,
    request: web::Json<ChangeRoleRequest>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    let (group_id, target_user_id) = path.into_inner();

    match group_service
        .change_role(user_id, group_id, target_user_id, request.into_inner().role)
        .await
    {
        Ok(member) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": member
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/groups/{id}/members/{user_id}/active",
    tag = "group",
    params(
        ("id" = i32, Path, description = "Group id"),
        ("user_id" = i32, Path, description = "Member")
    ),
    request_body = SetMemberActiveRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Membership toggled", body = MemberResponse),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn set_member_active(
    group_service: web::Data<GroupService>,
    req: HttpRequest,
    path: web::Path<(i32, i32)>,
    request: web::Json<SetMemberActiveRequest>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    let (group_id, target_user_id) = path.into_inner();

    match group_service
        .set_member_active(user_id, group_id, target_user_id, request.is_active)
        .await
    {
        Ok(member) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": member
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/groups/{id}/members/{user_id}",
    tag = "group",
    params(
        ("id" = i32, Path, description = "Group id"),
        ("user_id" = i32, Path, description = "Member")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Member removed"),
        (status = 403, description = "Not allowed to remove this member")
    )
)]
pub async fn remove_member(
    group_service: web::Data<GroupService>,
    req: HttpRequest,
    path: web::Path<(i32, i32)>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    let (group_id, target_user_id) = path.into_inner();

    match group_service
        .remove_member(user_id, group_id, target_user_id)
        .await
    {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Member removed"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/groups/{id}/join-requests",
    tag = "group",
    params(
        ("id" = i32, Path, description = "Group id"),
        JoinRequestQuery
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Join requests, newest first", body = [JoinRequestResponse]),
        (status = 403, description = "Not an admin or moderator")
    )
)]
pub async fn list_join_requests(
    group_service: web::Data<GroupService>,
    req: HttpRequest,
    path: web::Path<i32>,
    query: web::Query<JoinRequestQuery>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;

    match group_service
        .join_requests(user_id, path.into_inner(), query.into_inner().status)
        .await
    {
        Ok(requests) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": requests
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/groups/{id}/join-requests/{request_id}",
    tag = "group",
    params(
        ("id" = i32, Path, description = "Group id"),
        ("request_id" = i32, Path, description = "Join request id")
    ),
    request_body = ProcessJoinRequestRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Request approved or rejected", body = JoinRequestResponse),
        (status = 400, description = "Already processed"),
        (status = 403, description = "Not an admin or moderator")
    )
)]
pub async fn process_join_request(
    group_service: web::Data<GroupService>,
    req: HttpRequest,
    path: web::Path<(i32, i32)>,
    request: web::Json<ProcessJoinRequestRequest>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    let (group_id, request_id) = path.into_inner();

    match group_service
        .process_join_request(user_id, group_id, request_id, request.approve)
        .await
    {
        Ok(processed) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": processed
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn group_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/groups")
            .route("", web::post().to(create_group))
            .route("/public", web::get().to(list_public_groups))
            .route("/mine", web::get().to(list_my_groups))
            .route("/{id}", web::get().to(get_group))
            .route("/{id}", web::put().to(update_group))
            .route("/{id}", web::delete().to(delete_group))
            .route("/{id}/join", web::post().to(join_group))
            .route("/{id}/leave", web::post().to(leave_group))
            .route("/{id}/members", web::get().to(list_members))
            .route("/{id}/members/{user_id}", web::delete().to(remove_member))
            .route("/{id}/members/{user_id}/role", web::put().to(change_role))
            .route(
                "/{id}/members/{user_id}/active",
                web::put().to(set_member_active),
            )
            .route("/{id}/join-requests", web::get().to(list_join_requests))
            .route(
                "/{id}/join-requests/{request_id}",
                web::post().to(process_join_request),
            ),
    );
}
