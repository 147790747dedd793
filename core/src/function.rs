//! Typed remote functions.
//!
//! Each endpoint is a type implementing `WsFunction`: it knows its Moodle
//! function name, how to lay out its parameters, which wire shape its body
//! decodes into, and how that shape becomes domain output. `MoodleClient` is
//! generic over this trait, so no response is ever decoded into a catch-all
//! value.

use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::query::RemoteCall;

pub trait WsFunction {
    /// Value of the `wsfunction` parameter.
    const NAME: &'static str;

    /// Wire shape of the JSON body.
    type Response: DeserializeOwned;

    /// What callers receive.
    type Output;

    /// Endpoint-specific parameters on top of `wsfunction`.
    fn call(&self) -> RemoteCall;

    /// Reject warnings, then map the wire shape into domain output.
    fn into_output(response: Self::Response) -> Result<Self::Output>;
}
