use super::schema::{DefaultValue, FieldDef, FieldKind, Schema};
use crate::types::BOOTCAMPS;

pub const CAREERS: &[&str] =
    &["Web Development", "Mobile Development", "UI/UX", "Data Science", "Business", "Other"];

const URL_PATTERN: &str = r"https?://(www\.)?[-a-zA-Z0-9@:%._\+~#=]{1,256}\.[a-zA-Z0-9()]{1,6}\b([-a-zA-Z0-9()@:%_\+.~#?&//=]*)";

pub static SCHEMA: Schema = Schema {
    collection: BOOTCAMPS,
    fields: &[
        FieldDef::new("name", FieldKind::String)
            .required("Please add a name")
            .unique()
            .trimmed()
            .max_len(50, "Name can not be more than 50 characters"),
        FieldDef::new("slug", FieldKind::String).derived(),
        FieldDef::new("description", FieldKind::String)
            .required("Please add a description")
            .max_len(500, "Description can not be more than 500 characters"),
        FieldDef::new("website", FieldKind::String)
            .pattern(URL_PATTERN, "Please use a valid URL with HTTP or HTTPS"),
        FieldDef::new("phone", FieldKind::String)
            .max_len(20, "Phone number can not be longer than 20 characters"),
        FieldDef::new("email", FieldKind::String).pattern(super::EMAIL_PATTERN, "Please add a valid email"),
        // Replaced by `location` once geocoded.
        FieldDef::new("address", FieldKind::String).required("Please add an address"),
        FieldDef::new("location", FieldKind::Object).derived(),
        FieldDef::new("careers", FieldKind::StringArray)
            .required("Path `careers` is required.")
            .one_of(CAREERS),
        FieldDef::new("averageRating", FieldKind::Number)
            .min(1.0, "Rating must be at least 1")
            .max(10.0, "Rating must can not be more than 10")
            .derived(),
        FieldDef::new("averageCost", FieldKind::Number).derived(),
        FieldDef::new("photo", FieldKind::String).with_default(DefaultValue::Str("no-photo.jpg")),
        FieldDef::new("housing", FieldKind::Boolean).with_default(DefaultValue::Bool(false)),
        FieldDef::new("jobAssistance", FieldKind::Boolean).with_default(DefaultValue::Bool(false)),
        FieldDef::new("jobGuarantee", FieldKind::Boolean).with_default(DefaultValue::Bool(false)),
        FieldDef::new("acceptGi", FieldKind::Boolean).with_default(DefaultValue::Bool(false)),
        FieldDef::new("createdAt", FieldKind::Date).with_default(DefaultValue::Now).immutable(),
        FieldDef::new("user", FieldKind::ObjectId).required("Path `user` is required.").immutable(),
    ],
};
