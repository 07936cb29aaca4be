/// Store key under which the authenticated user's own record is kept.
pub const ME_ID: &str = "me";

/// Number of users kept in memory by the user repository.
pub const DEFAULT_USER_CACHE_SIZE: usize = 100;

/// Number of messages kept in memory by the message repository.
pub const DEFAULT_MESSAGE_CACHE_SIZE: usize = 1000;

/// Number of channels kept in memory by the channel repository.
pub const DEFAULT_CHANNEL_CACHE_SIZE: usize = 100;

/// Entities resubmitted per retry page.
pub const DEFAULT_RETRY_PAGE_SIZE: usize = 50;

/// Seconds between two scheduled retry passes.
pub const DEFAULT_RETRY_INTERVAL_SECS: u64 = 30;

/// Stream error code returned when the request rate limit is hit.
pub const CODE_RATE_LIMITED: i32 = 9;

/// Stream error code returned when a message is rejected by moderation.
pub const CODE_MESSAGE_MODERATION_FAILED: i32 = 73;

/// HTTP status for rate limiting.
pub const HTTP_TOO_MANY_REQUESTS: u16 = 429;
