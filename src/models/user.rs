use super::schema::{DefaultValue, FieldDef, FieldKind, Schema};
use crate::types::USERS;

/// Roles a client may pick for itself; `admin` is only granted out of band.
pub const SELF_ROLES: &[&str] = &["user", "publisher"];

/// Every stored role, accepted when filtering.
pub const ROLES: &[&str] = &["user", "publisher", "admin"];

pub static SCHEMA: Schema = Schema {
    collection: USERS,
    fields: &[
        FieldDef::new("name", FieldKind::String).required("Please add a name"),
        FieldDef::new("email", FieldKind::String)
            .required("Please add an email")
            .unique()
            .pattern(super::EMAIL_PATTERN, "Please add a valid email"),
        FieldDef::new("role", FieldKind::String)
            .one_of(SELF_ROLES)
            .filter_one_of(ROLES)
            .with_default(DefaultValue::Str("user")),
        FieldDef::new("password", FieldKind::String)
            .required("Please add a password")
            .min_len(6, "Password must be at least 6 characters")
            .hidden(),
        FieldDef::new("resetPasswordToken", FieldKind::String).derived().hidden(),
        FieldDef::new("resetPasswordExpire", FieldKind::Date).derived().hidden(),
        FieldDef::new("createdAt", FieldKind::Date).with_default(DefaultValue::Now).immutable(),
    ],
};
