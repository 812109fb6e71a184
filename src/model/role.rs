use super::leave_request::Actor;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Role {
    Admin = 1,
    Hr = 2,
    Employee = 3,
    System = 4,
    ApiUser = 5,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::Hr),
            3 => Some(Role::Employee),
            4 => Some(Role::System),
            5 => Some(Role::ApiUser),
            _ => None,
        }
    }

    /// Capacity in which this role acts on leave requests.
    pub fn leave_actor(&self) -> Option<Actor> {
        match self {
            Role::Admin | Role::Hr => Some(Actor::Administrator),
            Role::Employee => Some(Actor::Employee),
            Role::System | Role::ApiUser => None,
        }
    }

    pub fn is_administrator(&self) -> bool {
        matches!(self, Role::Admin | Role::Hr)
    }
}
