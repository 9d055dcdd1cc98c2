use crate::domain::user::models::UserProfile;

pub mod verify_access_token;

impl From<UserProfile> for crate::proto::Subject {
    fn from(profile: UserProfile) -> Self {
        Self {
            id: profile.id.to_string(),
            email: profile.email,
            name: profile.name,
            role: profile.role.as_str().to_string(),
            status: profile.status.as_str().to_string(),
            email_verified: profile.email_verified,
        }
    }
}
