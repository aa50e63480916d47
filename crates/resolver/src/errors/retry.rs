/// Classification for retry policy.
///
/// Used by the HTTP clients to decide what to do with a failed call to an
/// upstream service.
///
/// # Behavior Summary
///
/// | Class | Retry the call? | Resolution continues? |
/// |-------|-----------------|-----------------------|
/// | `Never` | No | No, the error propagates |
/// | `WithBackoff` | Yes, until the attempt budget is spent | Only if a retry succeeds |
/// | `NoResult` | No | Yes, the call counts as an empty answer |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Never retry - the upstream is unreachable or the input is invalid.
    Never,

    /// Transient failure (HTTP error status, timeout).
    ///
    /// The call is repeated after a delay that grows linearly with each
    /// attempt. Once the attempt budget is exhausted the failure surfaces
    /// as [`GeocodeError::RetriesExhausted`](super::GeocodeError::RetriesExhausted).
    WithBackoff,

    /// Permanent request failure that means "nothing to find here".
    ///
    /// Typically a malformed house number rejected by the interpolation
    /// service. The caller treats it as an empty response.
    NoResult,
}
