use axum::http::HeaderMap;

/// Payload signature check, supplied by the embedding application.
///
/// Receives the request headers and the raw, unparsed body. Returning false
/// rejects the delivery with 403 before anything is parsed or written.
pub trait SignatureVerifier: Send + Sync {
    fn verify(&self, headers: &HeaderMap, body: &[u8]) -> bool;
}

impl<F> SignatureVerifier for F
where
    F: Fn(&HeaderMap, &[u8]) -> bool + Send + Sync,
{
    fn verify(&self, headers: &HeaderMap, body: &[u8]) -> bool {
        self(headers, body)
    }
}
