use crate::api::admin::UserStats;
use crate::api::leave_request::{CreateLeave, LeaveFilter, LeaveListResponse};
use crate::api::report::{AttendanceStats, DepartmentStats};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::leave_request::{LeaveRequest, LeaveStatus};
use crate::model::user::PublicUser;
use crate::models::{LoginReq, RegisterAdminReq, RegisterReq, TokenPairResponse};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Timeclock API",
        version = "1.0.0",
        description = r#"
## Employee Time & Attendance System

This API powers an employee **time and attendance** system for small
organizations.

### 🔹 Key Features
- **Clock In / Clock Out**
  - One attendance record per employee per day, hours derived on clock-out
- **Leave Management**
  - Apply for leave, approve/reject requests, approved days become attendance
- **Attendance Dashboard**
  - Complete daily roster views, stats, and CSV exports for admins
- **Account Management**
  - Employee and admin signup, admin-side account administration

### 🔐 Security
Most endpoints are protected using **JWT Bearer authentication**.
Clocking and leave submission are **employee** operations; dashboards,
approvals and account administration require the **admin** role.

### 📦 Response Format
- JSON-based RESTful responses
- Pagination supported for the leave list endpoint

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::register_admin,
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,

        crate::api::attendance::clock_in,
        crate::api::attendance::clock_out,
        crate::api::attendance::my_attendance,
        crate::api::attendance::admin_attendance,

        crate::api::leave_request::create_leave,
        crate::api::leave_request::my_leaves,
        crate::api::leave_request::leave_list,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,

        crate::api::report::attendance_stats,
        crate::api::report::export_attendance,

        crate::api::admin::list_users,
        crate::api::admin::update_user
    ),
    components(
        schemas(
            LoginReq,
            RegisterReq,
            RegisterAdminReq,
            TokenPairResponse,
            PublicUser,
            AttendanceRecord,
            AttendanceStatus,
            LeaveRequest,
            LeaveStatus,
            CreateLeave,
            LeaveFilter,
            LeaveListResponse,
            AttendanceStats,
            DepartmentStats,
            UserStats
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Signup, login and token lifecycle APIs"),
        (name = "Attendance", description = "Clocking and attendance view APIs"),
        (name = "Leave", description = "Leave request and approval APIs"),
        (name = "Reports", description = "Dashboard stats and export APIs"),
        (name = "Admin", description = "Account administration APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
