// Submodules for separation of concerns
mod builder;
mod cancel;
mod envelope;
pub mod eval;
pub mod exec;
mod params;
mod types;

pub use builder::{PreparedQuery, QueryBuilder};
pub use cancel::{CancelHandle, CancelSignal, QueryContext, cancel_pair};
pub use envelope::{PageRef, Pagination, ResultEnvelope};
pub use eval::{eval_filter, miles_to_radians};
pub use params::{ParamValue, QueryParams, split_key};
pub use types::{
    CmpOp, DEFAULT_LIMIT, Filter, FindOptions, MAX_LIMIT, OpToken, Order, Populate, PopulateKind,
    SortSpec,
};
