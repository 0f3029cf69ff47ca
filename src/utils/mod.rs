pub mod args;
pub mod coerce;
pub mod feature_flags;
pub mod field_filter;
pub mod suggest;
