use super::schema::{DefaultValue, FieldDef, FieldKind, Schema};
use crate::types::COURSES;

pub const SKILLS: &[&str] = &["beginner", "intermediate", "advanced"];

pub static SCHEMA: Schema = Schema {
    collection: COURSES,
    fields: &[
        FieldDef::new("title", FieldKind::String).trimmed().required("Please add a course title"),
        FieldDef::new("description", FieldKind::String).required("Please add a description"),
        FieldDef::new("weeks", FieldKind::String).required("Please add number of weeks"),
        FieldDef::new("tuition", FieldKind::Number).required("Please add a tuition cost"),
        FieldDef::new("minimumSkill", FieldKind::String)
            .required("Please add a minimum skill")
            .one_of(SKILLS),
        FieldDef::new("scholarshipAvailable", FieldKind::Boolean)
            .with_default(DefaultValue::Bool(false)),
        FieldDef::new("createdAt", FieldKind::Date).with_default(DefaultValue::Now).immutable(),
        FieldDef::new("bootcamp", FieldKind::ObjectId)
            .required("Path `bootcamp` is required.")
            .immutable(),
        FieldDef::new("user", FieldKind::ObjectId).required("Path `user` is required.").immutable(),
    ],
};
