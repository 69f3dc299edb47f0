//! The statement surface: a regex-based parser producing inert [`Statement`]
//! values, the planner that turns conditions into scan strategies, and the
//! session gluing statements to the paged engine.
pub mod parser;
pub mod planner;
pub mod session;
pub mod statement;


pub use parser::Parser;
pub use session::{Session, StatementResult};
pub use statement::{Condition, Operator, OrderBy, Statement};
