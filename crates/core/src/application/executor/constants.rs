// Rollback executor constants (no magic values)
use std::time::Duration;

/// Core workers per available CPU
pub const CORE_WORKERS_PER_CPU: usize = 5;

/// Upper bound of workers per available CPU (core + overflow)
pub const MAX_WORKERS_PER_CPU: usize = 10;

/// Idle time after which an overflow worker retires (60s)
pub const WORKER_KEEP_ALIVE: Duration = Duration::from_secs(60);

/// Bounded submission queue length
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Time granted to in-flight rollbacks on shutdown (30s)
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// Name used in log fields
pub const EXECUTOR_NAME: &str = "rollback-executor";
