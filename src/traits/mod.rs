mod client;
mod platform;

pub use client::{
    AttachParams, ConnectionHandle, CursorHandle, ExecuteOutcome, NativeClient, NativeResult,
    StatementHandle, TransactionHandle,
};
pub use platform::{DatabasePlatform, DefaultPlatform, SchemaManager};
