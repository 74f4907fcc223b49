use crate::strategy::Strategy;

///
/// ExecutionTrace
/// Per-call execution summary returned by the `*_with_trace` entry points.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ExecutionTrace {
    pub strategy: Strategy,
    pub queries_issued: u32,
    pub rows_scanned: usize,
    pub rows_returned: usize,
}

impl ExecutionTrace {
    pub(super) const fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            queries_issued: 0,
            rows_scanned: 0,
            rows_returned: 0,
        }
    }

    pub(super) const fn record_query(&mut self, rows_scanned: usize) {
        self.queries_issued += 1;
        self.rows_scanned += rows_scanned;
    }
}
