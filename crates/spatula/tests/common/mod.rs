#![allow(dead_code)]

use std::cell::RefCell;

use async_trait::async_trait;
use spatula::{HttpError, RequestError, Response, Transport, Url};

/// Answers every URL with a canned body, except `error` which fails with a
/// 400 and `broken` which fails outside of HTTP.
#[derive(Default)]
pub struct DummyTransport {
    pub requested: std::sync::Mutex<Vec<String>>,
}

impl DummyTransport {
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for DummyTransport {
    async fn request(&self, url: &Url) -> Result<Response, RequestError> {
        self.requested.lock().unwrap().push(url.url.clone());
        match url.url.as_str() {
            "error" => Err(HttpError {
                status_code: Some(400),
                url: "error".into(),
                text: "error response".into(),
            }
            .into()),
            "broken" => Err(RequestError::Other(anyhow::anyhow!("broken pipe"))),
            other => Ok(Response::new(
                other,
                200,
                format!("dummy response for {other}"),
            )),
        }
    }
}

/// Records hook calls in order.
#[derive(Default)]
pub struct Calls(RefCell<Vec<&'static str>>);

impl Calls {
    pub fn push(&self, call: &'static str) {
        self.0.borrow_mut().push(call);
    }

    pub fn get(&self) -> Vec<&'static str> {
        self.0.borrow().clone()
    }
}
