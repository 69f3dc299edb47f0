mod row;
mod tuple;

#[cfg(test)]
mod tests;

pub use row::Row;
pub use tuple::{overwrite_xmax, Tuple, TupleHeader, TUPLE_HEADER_SIZE};
