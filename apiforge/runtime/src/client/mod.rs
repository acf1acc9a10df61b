//! Client-side support for generated SDKs.
//!
//! Generated `_async` methods build a `reqwest` request, check the status
//! with [`ensure_success`] and decode the payload with the helpers here or the
//! client's [`CodecRegistry`](crate::CodecRegistry). The callback variants
//! hand the same future to a [`Dispatcher`].
//!
//! ## Examples
//!
//! ```rust,ignore
//! let dispatcher = Dispatcher::inline(tokio::runtime::Handle::current());
//! let client = PetstoreClient::new("http://localhost:8080", dispatcher);
//!
//! client.get_user(1, |result| match result {
//!     Ok(user) => println!("{user:?}"),
//!     Err(e) => eprintln!("{e}"),
//! });
//! ```

mod dispatch;

use std::fmt::Display;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::Value;

pub use crate::error::ClientError;
pub use dispatch::{Delivery, DeliveryQueue, Dispatcher, InlineDelivery, Job, QueueDelivery};

use crate::codec::Codec;
use crate::error::DecodeError;

/// Fails with [`ClientError::Http`] unless the status is 2xx.
pub async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::debug!(status = status.as_u16(), "request failed");
    Err(ClientError::Http {
        status: status.as_u16(),
        body,
    })
}

/// Reads the response body as text.
pub async fn read_text(response: reqwest::Response) -> Result<String, ClientError> {
    Ok(response.text().await?)
}

/// Reads the response body as a JSON tree.
pub async fn read_json(response: reqwest::Response) -> Result<Value, ClientError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(DecodeError::from(e)))
}

/// Decodes a raw list payload with the element codec.
pub fn decode_raw_list<T: Codec>(raw: &str) -> Result<Vec<T>, ClientError> {
    let value: Value = serde_json::from_str(raw).map_err(DecodeError::from)?;
    Ok(Vec::<T>::decode(&value)?)
}

/// Joins list parameter values with `,`.
///
/// ```
/// use apiforge_runtime::client::join_list;
///
/// assert_eq!(join_list(&[1, 2, 3]), "1,2,3");
/// assert_eq!(join_list::<i64>(&[]), "");
/// ```
pub fn join_list<T: Display>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Everything but the RFC 3986 unreserved characters.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// Percent-encodes a value substituted into one path segment.
///
/// ```
/// use apiforge_runtime::client::path_segment;
///
/// assert_eq!(path_segment("a/b c"), "a%2Fb%20c");
/// assert_eq!(path_segment("978-0"), "978-0");
/// ```
pub fn path_segment(text: &str) -> String {
    utf8_percent_encode(text, PATH_SEGMENT).to_string()
}

/// JSON text of a structured value, for path, query, header or form slots.
pub fn json_text<T: Codec>(value: &T) -> String {
    value.encode().to_string()
}
