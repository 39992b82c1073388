//! Easy2 Handler that buffers the response body for JSON decoding.

/// Handler state for one transfer. Implements curl's Handler for Easy2.
#[derive(Debug, Default)]
pub struct ResponseHandler {
    pub(crate) body: Vec<u8>,
}

impl curl::easy::Handler for ResponseHandler {
    fn write(&mut self, data: &[u8]) -> Result<usize, curl::easy::WriteError> {
        self.body.extend_from_slice(data);
        Ok(data.len())
    }
}
