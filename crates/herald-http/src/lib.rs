//! reqwest plumbing shared by the Slack and GitHub clients: request timeouts,
//! opt-in retries for rate limits and server errors, and JSON decoding with
//! operation-labelled errors.

pub mod json_transport;
pub mod retry_policy;

pub use json_transport::{error_excerpt, JsonTransport, RETRY_ATTEMPT_HEADER};
pub use retry_policy::{retry_after_from_headers, RetryPolicy};
