//! Request negotiation signals consumed by serializer dispatch

/// The two response-shape signals this core negotiates on: a raw-value
/// request (`.../$value`) and a count request (`.../$count`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestSignals {
    raw_value: bool,
    count: bool,
}

impl RequestSignals {
    pub const NONE: Self = Self {
        raw_value: false,
        count: false,
    };

    pub fn new(raw_value: bool, count: bool) -> Self {
        Self { raw_value, count }
    }

    /// Whether the client asked for the bare scalar value of a
    /// primitive/enum property.
    pub fn raw_value(&self) -> bool {
        self.raw_value
    }

    /// Whether the client asked for only the cardinality of a collection.
    pub fn count(&self) -> bool {
        self.count
    }

    /// Extracts the signals from a request path: the final segment decides.
    pub fn from_path(path: &str) -> Self {
        let last = path.trim_end_matches('/').rsplit('/').next().unwrap_or("");
        Self {
            raw_value: last == "$value",
            count: last == "$count",
        }
    }

    /// Extracts the signals from an inbound request.
    pub fn from_request<T>(request: &http::Request<T>) -> Self {
        Self::from_path(request.uri().path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_segment_decides_the_signal() {
        assert_eq!(
            RequestSignals::from_path("/odata/Customers(1)/name/$value"),
            RequestSignals::new(true, false)
        );
        assert_eq!(
            RequestSignals::from_path("/odata/Customers/$count"),
            RequestSignals::new(false, true)
        );
        assert_eq!(
            RequestSignals::from_path("/odata/Customers"),
            RequestSignals::NONE
        );
    }

    #[test]
    fn from_request_reads_the_uri_path() {
        let request = http::Request::builder()
            .uri("http://localhost/odata/Customers/$count?$filter=x")
            .body(())
            .unwrap();
        assert!(RequestSignals::from_request(&request).count());
    }
}
