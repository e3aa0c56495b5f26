/**
 * How long (milliseconds) to wait before starting the backend process again
 * after it exits or its pipes break.
 */
pub const RELAUNCH_DELAY: u64 = 1000;

/**
 * How many queued invocations the client -> worker channel may hold.
 */
pub const INVOKE_QUEUE: usize = 32;

/**
 * How many bridge events the worker -> gui channel may hold.
 */
pub const EVENT_QUEUE: usize = 64;

/**
 * The backend executable that is spawned when the user does not pass
 * --backend on the command line. Resolved through PATH.
 */
pub const DEFAULT_BACKEND: &str = "qtshock-backend";
