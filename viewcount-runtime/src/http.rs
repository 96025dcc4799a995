use {
    std::{convert::Infallible, pin::Pin, sync::Arc},
    tracing::{error, warn},
    hyper::{Response, StatusCode, body::Bytes, header::{HeaderName, HeaderValue}},
    http_body_util::Full,
    viewcount_core::{FunctionUrlEvent, FunctionUrlResponse},
    crate::function::Function,
};

/// Serves a function the way a function url runtime does: every http request becomes one invocation.
#[derive(Clone)]
pub struct HttpHandler {
    function: Arc<dyn Function + Send + Sync>,
}

impl HttpHandler {
    pub fn new(function: Arc<dyn Function + Send + Sync>) -> Self {
        Self {
            function,
        }
    }
}

impl hyper::service::Service<hyper::Request<hyper::body::Incoming>> for HttpHandler {
    type Response = Response<Full<Bytes>>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: hyper::Request<hyper::body::Incoming>) -> Self::Future {
        let function = self.function.clone();
        let event = event_from_request(&req);

        Box::pin(async move {
            // storage calls are blocking
            let response = match tokio::task::spawn_blocking(move || function.handle(&event)).await {
                Ok(v) => into_http_response(v),
                Err(err) => {
                    error!("function failed while handling request: {err:?}");
                    response_function_panicked()
                }
            };

            Ok(response)
        })
    }
}

pub fn event_from_request<B>(req: &hyper::Request<B>) -> FunctionUrlEvent {
    let mut event = FunctionUrlEvent::new()
        .with_raw_path(req.uri().path())
        .with_raw_query_string(req.uri().query().unwrap_or(""))
        .with_method(req.method().as_str());

    for name in req.headers().keys() {
        let values = req.headers().get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect::<Vec<_>>();
        if !values.is_empty() {
            event = event.with_header(name.as_str(), values.join(","));
        }
    }

    event
}

pub fn into_http_response(function_response: FunctionUrlResponse) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(function_response.body)));
    *response.status_mut() = function_response.status_code;

    for (name, value) in function_response.headers {
        match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(&value)) {
            (Ok(name), Ok(value)) => {
                response.headers_mut().insert(name, value);
            },
            _ => warn!(header = %name, "dropping invalid response header"),
        }
    }

    response
}

fn response_function_panicked() -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from("function panicked while handling request.\n")));
    *response.status_mut() = StatusCode::BAD_GATEWAY;
    response
}
