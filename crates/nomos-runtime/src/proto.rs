//! Provider RPC wire messages
//!
//! Binary-framed, field-tagged protobuf messages derived with prost (no
//! protoc involved). Every frame on the wire is one length-delimited
//! `Request` or `Response` envelope; the `id` correlates a response with its
//! request on the shared connection.

/// Health status value a live provider must report.
pub const STATUS_OK: &str = "ok";

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HealthRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HealthResponse {
    #[prost(string, tag = "1")]
    pub status: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct InitializeRequest {
    #[prost(string, tag = "1")]
    pub alias: ::prost::alloc::string::String,
    /// JSON-encoded provider-specific configuration
    #[prost(string, tag = "2")]
    pub config_json: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct InitializeResponse {
    #[prost(string, repeated, tag = "1")]
    pub capabilities: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
    #[prost(string, repeated, tag = "2")]
    pub errors: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetRequest {
    /// Path segments; a trailing `*` selects the provider's whole tree
    #[prost(string, repeated, tag = "1")]
    pub path: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetResponse {
    /// JSON-encoded value; empty together with `error` empty means null
    #[prost(string, tag = "1")]
    pub value_json: ::prost::alloc::string::String,
    /// Non-empty on failure
    #[prost(string, tag = "2")]
    pub error: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListResponse {
    #[prost(string, repeated, tag = "1")]
    pub keys: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ShutdownRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ShutdownResponse {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Request {
    #[prost(uint64, tag = "1")]
    pub id: u64,
    #[prost(oneof = "request::Body", tags = "2, 3, 4, 5, 6")]
    pub body: ::core::option::Option<request::Body>,
}

pub mod request {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Body {
        #[prost(message, tag = "2")]
        Health(super::HealthRequest),
        #[prost(message, tag = "3")]
        Initialize(super::InitializeRequest),
        #[prost(message, tag = "4")]
        Get(super::GetRequest),
        #[prost(message, tag = "5")]
        List(super::ListRequest),
        #[prost(message, tag = "6")]
        Shutdown(super::ShutdownRequest),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Response {
    #[prost(uint64, tag = "1")]
    pub id: u64,
    #[prost(oneof = "response::Body", tags = "2, 3, 4, 5, 6")]
    pub body: ::core::option::Option<response::Body>,
}

pub mod response {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Body {
        #[prost(message, tag = "2")]
        Health(super::HealthResponse),
        #[prost(message, tag = "3")]
        Initialize(super::InitializeResponse),
        #[prost(message, tag = "4")]
        Get(super::GetResponse),
        #[prost(message, tag = "5")]
        List(super::ListResponse),
        #[prost(message, tag = "6")]
        Shutdown(super::ShutdownResponse),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn envelope_round_trips() {
        let req = Request {
            id: 7,
            body: Some(request::Body::Get(GetRequest {
                path: vec!["db".into(), "host".into()],
            })),
        };
        let bytes = req.encode_to_vec();
        let decoded = Request::decode(bytes.as_slice()).unwrap();
        assert_eq!(decoded, req);
    }

    #[test]
    fn empty_body_decodes_to_none() {
        let resp = Response { id: 1, body: None };
        let bytes = resp.encode_to_vec();
        let decoded = Response::decode(bytes.as_slice()).unwrap();
        assert!(decoded.body.is_none());
    }
}
