/// File extension of a dynamic library's runtime artifact when a configuration does not declare one.
pub const DEFAULT_RUNTIME_EXTENSION: &str = "dll";

/// Parallelism used when the platform cannot report its hardware thread count.
pub const FALLBACK_PARALLELISM: usize = 4;
