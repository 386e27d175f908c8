// Assumption Engine
// Operator registry, payload parsing, execution and row-store drivers

pub mod assumption;
pub mod drivers;
pub mod executor;
pub mod operators;
pub mod registry;
pub mod traits;

pub use assumption::AssumptionParser;
pub use drivers::{connect_row_store, MySqlRowStore, SqliteRowStore};
pub use executor::QueryExecutor;
pub use operators::OperatorStrategy;
pub use registry::OperatorRegistry;
pub use traits::RowStore;
