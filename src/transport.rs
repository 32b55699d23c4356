use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShadowRequest {
    Publish(String),
    Poll,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShadowEndpoint {
    pub host: String,
    pub thing: String,
}

impl Default for ShadowEndpoint {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            thing: "maze".to_string(),
        }
    }
}

impl ShadowEndpoint {
    pub fn path(&self) -> String {
        format!("/things/{}/shadow", self.thing)
    }
}

impl ShadowRequest {
    pub fn method(&self) -> &'static str {
        match self {
            Self::Publish(_) => "POST",
            Self::Poll => "GET",
        }
    }

    pub fn to_http(&self, endpoint: &ShadowEndpoint) -> String {
        let mut text = format!(
            "{} {} HTTP/1.1\r\nHost: {}\r\nConnection: Keep-Alive\r\n",
            self.method(),
            endpoint.path(),
            endpoint.host
        );
        match self {
            Self::Publish(document) => {
                text.push_str("Content-Type: application/json; charset=utf-8\r\n");
                text.push_str(&format!("Content-Length: {}\r\n\r\n", document.len()));
                text.push_str(document);
            }
            Self::Poll => text.push_str("\r\n"),
        }
        text
    }
}

/// Body of a raw HTTP response, or the whole payload when it carries no
/// header block.
pub fn response_body(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    match text.find("\r\n\r\n") {
        Some(idx) => text[idx + 4..].to_string(),
        None => text.into_owned(),
    }
}
