//! Error shared by every backend REST resource port.

use super::define_port_error;

define_port_error! {
    /// Failures reported by backend resource adapters.
    ///
    /// `Conflict` carries the uniqueness violations callers must tell apart
    /// from generic failures.
    pub enum BackendError {
        /// Transport failure or timeout.
        Connection { message: String } => "backend unreachable: {message}",
        /// The bearer token was missing or rejected.
        Unauthorized { message: String } => "backend rejected credentials: {message}",
        /// The account may not perform the request (for example, banned).
        Forbidden { message: String } => "backend refused the request: {message}",
        /// The addressed resource does not exist.
        NotFound { message: String } => "backend resource not found: {message}",
        /// A uniqueness constraint was violated.
        Conflict { message: String } => "backend reported a conflict: {message}",
        /// Any other client error.
        Rejected { status: u16, message: String } =>
            "backend rejected the request with status {status}: {message}",
        /// The backend failed internally.
        Server { status: u16, message: String } =>
            "backend failed with status {status}: {message}",
        /// The response body did not match the expected schema.
        Decode { message: String } => "backend response could not be decoded: {message}",
    }
}
