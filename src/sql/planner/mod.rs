mod plan;


pub use plan::{filter_row, Plan};
