pub mod compile_time {
    pub mod extraction {
        /// Confidence assigned to a verbatim path hit
        pub const DIRECT_PATH_CONFIDENCE: f64 = 1.0;

        /// Confidence assigned to a hit through a template-family path rewrite
        pub const TEMPLATE_PATH_CONFIDENCE: f64 = 0.8;

        /// Confidence assigned to a fuzzy `settings[]` array match
        pub const ARRAY_SCAN_CONFIDENCE: f64 = 0.6;

        /// Upper bound for any hit found through an alternate path or name
        pub const ALTERNATE_NAME_CONFIDENCE_CAP: f64 = 0.5;

        /// Lower bound of the High extraction-confidence band
        pub const HIGH_CONFIDENCE_THRESHOLD: f64 = 0.8;

        /// Lower bound of the Medium extraction-confidence band
        pub const MEDIUM_CONFIDENCE_THRESHOLD: f64 = 0.5;

        /// Minimum normalized name length for substring matching in array scans
        pub const DEFAULT_MIN_NAME_MATCH_LENGTH: usize = 4;

        /// Maximum array elements inspected by a single array scan
        /// RESOURCE: bounds work on pathological payloads
        pub const MAX_ARRAY_SCAN_ELEMENTS: usize = 10_000;
    }

    pub mod paths {
        /// Maximum accepted length of a path expression
        /// SECURITY: rejects oversized catalog input before parsing
        pub const MAX_PATH_EXPRESSION_LENGTH: usize = 1024;

        /// Maximum number of segments in a compiled path
        pub const MAX_PATH_SEGMENTS: usize = 64;
    }

    pub mod catalog {
        /// Maximum catalog file size (16MB)
        /// SECURITY: prevents memory exhaustion through oversized catalogs
        pub const MAX_CATALOG_FILE_SIZE: u64 = 16 * 1024 * 1024;

        /// Maximum number of requirements in one catalog
        pub const MAX_REQUIREMENTS: usize = 100_000;

        /// Catalog format version assumed when a document omits it
        pub const DEFAULT_CATALOG_VERSION: &str = "1.0";
    }

    pub mod evaluation {
        /// Absolute tolerance for `numeric_exact`
        pub const NUMERIC_EPSILON: f64 = 1e-9;
    }

    pub mod runner {
        /// Default cap for worker threads when the configuration is silent
        pub const DEFAULT_MAX_WORKERS_CAP: usize = 8;

        /// Hard ceiling on configurable worker threads
        /// RESOURCE: keeps thread creation bounded
        pub const MAX_WORKERS: usize = 256;
    }

    pub mod source {
        /// Default time-to-live for cached policy snapshots
        pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 300;

        /// Maximum size of a single exported policy file (32MB)
        pub const MAX_POLICY_FILE_SIZE: u64 = 32 * 1024 * 1024;
    }
}
