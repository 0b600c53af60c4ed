use super::schema::{DefaultValue, FieldDef, FieldKind, Schema};
use crate::types::REVIEWS;

pub static SCHEMA: Schema = Schema {
    collection: REVIEWS,
    fields: &[
        FieldDef::new("title", FieldKind::String)
            .trimmed()
            .required("Please add a title for the review")
            .max_len(100, "Title can not be more than 100 characters"),
        FieldDef::new("text", FieldKind::String).required("Please add some text"),
        FieldDef::new("rating", FieldKind::Number)
            .required("Please add a rating between 1 and 10")
            .min(1.0, "Rating must be at least 1")
            .max(10.0, "Rating can not be more than 10"),
        FieldDef::new("createdAt", FieldKind::Date).with_default(DefaultValue::Now).immutable(),
        FieldDef::new("bootcamp", FieldKind::ObjectId)
            .required("Path `bootcamp` is required.")
            .immutable(),
        FieldDef::new("user", FieldKind::ObjectId).required("Path `user` is required.").immutable(),
    ],
};
