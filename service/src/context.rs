/// State a single query runs against. Built per request by the service and
/// never handed a writable store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryContext {
    pub block_height: u64,
}

impl QueryContext {
    pub fn new(block_height: u64) -> Self {
        Self { block_height }
    }
}
