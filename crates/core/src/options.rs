bitflags::bitflags! {
    /// Result-shaping options for [`Fetcher::fetch`](crate::Fetcher::fetch).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FetchOptions: u8 {
        /// Reverse each per-context result before predicates run.
        const REVERSE = 1;
        /// Keep the node that triggered `stop_at` (if the filter accepts it).
        const INCLUDE_STOP = 2;
        /// Collapse duplicates and sort the combined result into document order.
        const UNIQUE = 4;
        /// Evaluate once without a context node instead of once per context node.
        const IGNORE_CONTEXT = 8;
    }
}
