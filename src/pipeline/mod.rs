pub mod comparator;
pub mod pipeline;
