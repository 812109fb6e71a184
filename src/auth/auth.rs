use crate::error::AppError;
use crate::model::{leave_request::Actor, role::Role};
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload};
use futures::future::{Ready, ready};

/// Identity of the caller, placed in request extensions by `auth_middleware`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthUser>()
                .cloned()
                .ok_or_else(|| AppError::Forbidden("Not authenticated".into())),
        )
    }
}

impl AuthUser {
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.role.is_administrator() {
            Ok(())
        } else {
            Err(AppError::Forbidden("HR/Admin only".into()))
        }
    }

    /// Administrators, or the scheduler's service account.
    pub fn require_admin_or_system(&self) -> Result<(), AppError> {
        if self.role.is_administrator() || self.role == Role::System {
            Ok(())
        } else {
            Err(AppError::Forbidden("HR/Admin only".into()))
        }
    }

    pub fn require_employee(&self) -> Result<u64, AppError> {
        self.employee_id
            .ok_or_else(|| AppError::Forbidden("No employee profile".into()))
    }

    pub fn leave_actor(&self) -> Result<Actor, AppError> {
        self.role
            .leave_actor()
            .ok_or_else(|| AppError::Forbidden("Role cannot act on leave requests".into()))
    }

    /// Administrators see everyone; others only their own employee id.
    pub fn can_view_employee(&self, employee_id: u64) -> bool {
        self.role.is_administrator() || self.employee_id == Some(employee_id)
    }
}
