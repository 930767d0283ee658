/// Prefix for generated booking reference codes, e.g. "TZ3F9A01BC".
pub const BOOKING_REFERENCE_PREFIX: &str = "TZ";

/// Prefix for generated payment reference codes, e.g. "PAY0D4E9921AB".
pub const PAYMENT_REFERENCE_PREFIX: &str = "PAY";

/// Attempts for transient database failures (lock timeout, deadlock,
/// serialization) before surfacing a generic retry-later error.
pub const TRANSIENT_RETRY_ATTEMPTS: u32 = 3;

/// Attempts to regenerate a booking reference on a uniqueness collision.
pub const REFERENCE_RETRY_ATTEMPTS: u32 = 5;

/// Default page size for listing endpoints.
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Maximum page size for listing endpoints.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Default currency for all prices.
pub const DEFAULT_CURRENCY: &str = "USD";
