
pub use self::in_memory_test::{InMemoryTestClient, LiveHandles, NativeCall, Operation};
