//! # Execution Collaborators
//!
//! Services a tool's `execute()` body relies on but which are not part of the
//! lifecycle itself.
//!
//! ## Modules
//!
//! - **`dispatcher`**: a bounded worker pool (sized by `nb-cores`) on which a
//!   tool runs its parallel sub-tasks. Failures of individual commands are
//!   collected and reported together.
//! - **`progress`**: progress reporters handed out by
//!   `Tool::create_iterator_listener`; every reporter can be updated
//!   concurrently from the dispatcher's worker threads.

pub mod dispatcher;
pub mod progress;
