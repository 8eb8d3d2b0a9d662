use http::HeaderValue;
use serde_json::{Map, Value};
use url::form_urlencoded;
use uuid::Uuid;

use crate::error::Auth0Error;

pub(crate) const JSON_CONTENT_TYPE: &str = "application/json";
pub(crate) const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Payload of a request and the encoding it is sent with.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Body {
    /// An explicit body takes precedence over the parameters.
    Json {
        body: Option<Value>,
        parameters: Map<String, Value>,
    },
    Form(Vec<(String, String)>),
    Multipart(Vec<Part>),
}

/// Single part of a `multipart/form-data` body.
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    name: String,
    content: PartContent,
}

#[derive(Debug, Clone, PartialEq)]
enum PartContent {
    Text(String),
    File {
        filename: String,
        content_type: String,
        data: Vec<u8>,
    },
}

impl Part {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: PartContent::Text(value.into()),
        }
    }

    pub fn file(
        name: impl Into<String>,
        filename: impl Into<String>,
        content_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            content: PartContent::File {
                filename: filename.into(),
                content_type: content_type.into(),
                data,
            },
        }
    }
}

/// Encoded body together with the content type mandated by its encoding.
pub(crate) struct EncodedBody {
    pub(crate) content_type: HeaderValue,
    pub(crate) bytes: Vec<u8>,
}

impl Body {
    pub(crate) fn json() -> Self {
        Body::Json {
            body: None,
            parameters: Map::new(),
        }
    }

    /// Adds a parameter. Form fields and multipart parts take the value as text.
    pub(crate) fn add_parameter(&mut self, name: String, value: Value) {
        match self {
            Body::Json { parameters, .. } => {
                parameters.insert(name, value);
            }
            Body::Form(fields) => fields.push((name, as_text(value))),
            Body::Multipart(parts) => parts.push(Part::text(name, as_text(value))),
        }
    }

    pub(crate) fn encode(&self) -> Result<EncodedBody, Auth0Error> {
        match self {
            Body::Json { body, parameters } => {
                let bytes = match body {
                    Some(body) => serde_json::to_vec(body),
                    None if parameters.is_empty() => Ok(Vec::new()),
                    None => serde_json::to_vec(parameters),
                }
                .map_err(|err| Auth0Error::RequestBody(err.to_string()))?;
                Ok(EncodedBody {
                    content_type: HeaderValue::from_static(JSON_CONTENT_TYPE),
                    bytes,
                })
            }
            Body::Form(fields) => {
                let encoded = form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(fields)
                    .finish();
                Ok(EncodedBody {
                    content_type: HeaderValue::from_static(FORM_CONTENT_TYPE),
                    bytes: encoded.into_bytes(),
                })
            }
            Body::Multipart(parts) => encode_multipart(parts, &Uuid::now_v7().simple().to_string()),
        }
    }

    /// Whether the encoding sets its own `Content-Type`, ignoring the one of the caller.
    pub(crate) fn forces_content_type(&self) -> bool {
        !matches!(self, Body::Json { .. })
    }
}

fn as_text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        other => other.to_string(),
    }
}

fn encode_multipart(parts: &[Part], boundary: &str) -> Result<EncodedBody, Auth0Error> {
    if parts.is_empty() {
        return Err(Auth0Error::RequestBody(
            "Cannot create multipart/form-data request body with zero parts.".into(),
        ));
    }

    let mut bytes = Vec::new();
    for part in parts {
        bytes.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        match &part.content {
            PartContent::Text(value) => {
                bytes.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                        escape(&part.name)
                    )
                    .as_bytes(),
                );
                bytes.extend_from_slice(value.as_bytes());
            }
            PartContent::File {
                filename,
                content_type,
                data,
            } => {
                bytes.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        escape(&part.name),
                        escape(filename),
                        content_type
                    )
                    .as_bytes(),
                );
                bytes.extend_from_slice(data);
            }
        }
        bytes.extend_from_slice(b"\r\n");
    }
    bytes.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    let content_type = HeaderValue::from_str(&format!("multipart/form-data; boundary={boundary}"))
        .map_err(|err| Auth0Error::RequestBody(err.to_string()))?;
    Ok(EncodedBody {
        content_type,
        bytes,
    })
}

/// Percent-encodes the characters that would break a quoted Content-Disposition parameter.
fn escape(value: &str) -> String {
    value
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
