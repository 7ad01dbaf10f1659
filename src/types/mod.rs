mod fetch_mode;
mod row;
mod sql_value;

pub use fetch_mode::{codes, FetchArgs, FetchMode, FromRecord, ObjectSchema};
pub use row::{Associative, ClassObject, FetchedRow, MixedKey, MixedRow, RawRecord, Record};
pub use sql_value::{ParamType, SqlValue};
