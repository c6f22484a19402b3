use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::{
    AccountType, JoinRequestStatus, KhatmaType, KhatmaVisibility, MemorialFrequency,
    MembershipRole, NotificationType, ReadingStatus, RecitationMethod, ReminderFrequency,
};
use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::refresh,
        handlers::auth::logout,
        handlers::user::get_profile,
        handlers::user::update_profile,
        handlers::user::delete_account,
        handlers::deceased::create_deceased,
        handlers::deceased::list_deceased,
        handlers::deceased::get_deceased,
        handlers::deceased::update_deceased,
        handlers::deceased::delete_deceased,
        handlers::khatma::create_khatma,
        handlers::khatma::list_public_khatmas,
        handlers::khatma::list_my_khatmas,
        handlers::khatma::get_shared_khatma,
        handlers::khatma::get_khatma,
        handlers::khatma::update_khatma,
        handlers::khatma::delete_khatma,
        handlers::khatma::complete_khatma,
        handlers::khatma::share_khatma,
        handlers::khatma::get_progress,
        handlers::khatma::join_khatma,
        handlers::khatma::leave_khatma,
        handlers::khatma::list_participants,
        handlers::khatma::remove_participant,
        handlers::part::assign_part,
        handlers::part::complete_part,
        handlers::part::uncomplete_part,
        handlers::reading::start_reading,
        handlers::reading::list_readings,
        handlers::reading::update_reading_status,
        handlers::group::create_group,
        handlers::group::list_public_groups,
        handlers::group::list_my_groups,
        handlers::group::get_group,
        handlers::group::update_group,
        handlers::group::delete_group,
        handlers::group::join_group,
        handlers::group::leave_group,
        handlers::group::list_members,
        handlers::group::change_role,
        handlers::group::set_member_active,
        handlers::group::remove_member,
        handlers::group::list_join_requests,
        handlers::group::process_join_request,
        handlers::notification::list_notifications,
        handlers::notification::unread_count,
        handlers::notification::mark_read,
        handlers::notification::mark_all_read,
        handlers::notification::delete_notification,
        handlers::notification::delete_all_notifications,
    ),
    components(
        schemas(
            HealthResponse,
            AffectedResponse,
            RegisterRequest,
            LoginRequest,
            RefreshRequest,
            UserResponse,
            AuthResponse,
            RefreshResponse,
            ProfileResponse,
            UserStatistics,
            ProfileDetailResponse,
            UpdateProfileRequest,
            DeleteAccountRequest,
            AccountType,
            CreateDeceasedRequest,
            UpdateDeceasedRequest,
            DeceasedResponse,
            MemorialFrequency,
            CreateKhatmaRequest,
            UpdateKhatmaRequest,
            KhatmaResponse,
            KhatmaPartResponse,
            KhatmaProgressResponse,
            KhatmaDetailResponse,
            ShareKhatmaResponse,
            ParticipantResponse,
            AssignPartRequest,
            KhatmaType,
            KhatmaVisibility,
            ReminderFrequency,
            StartReadingRequest,
            UpdateReadingStatusRequest,
            ReadingResponse,
            ReadingStatus,
            RecitationMethod,
            CreateGroupRequest,
            UpdateGroupRequest,
            GroupResponse,
            GroupDetailResponse,
            JoinGroupRequest,
            JoinGroupOutcome,
            JoinGroupResponse,
            MemberResponse,
            ChangeRoleRequest,
            SetMemberActiveRequest,
            ProcessJoinRequestRequest,
            JoinRequestResponse,
            MembershipRole,
            JoinRequestStatus,
            NotificationResponse,
            UnreadCountResponse,
            NotificationType,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Liveness"),
        (name = "auth", description = "Registration and tokens"),
        (name = "user", description = "Profile and account"),
        (name = "deceased", description = "Memorial records"),
        (name = "khatma", description = "Reading cycles"),
        (name = "part", description = "Khatma parts"),
        (name = "reading", description = "Personal reading log"),
        (name = "group", description = "Reading groups"),
        (name = "notification", description = "In-app notifications"),
    ),
    info(
        title = "Khatma Backend API",
        version = "1.0.0",
        description = "REST API for collective Quran reading cycles"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_routes_and_bearer_scheme() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/khatmas/{id}/parts/{part_number}/complete"));
        assert!(doc.paths.paths.contains_key("/groups/{id}/join-requests"));
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
