use {
    tracing::{info, error, debug},
    viewcount_core::{
        CounterRecord,
        ErrorBody,
        FunctionUrlEvent,
        FunctionUrlResponse,
        ROOT_PATH,
        StatusCode,
        ViewCountBody,
    },
    crate::{
        kv::KVStorage,
        table::Table,
        error::CounterError,
    },
};

pub const DEFAULT_TABLE_NAME: &str = "cloudportfolio-test";
pub const DEFAULT_COUNTER_ID: &str = "0";

/// Used when even the error description cannot be encoded.
const FALLBACK_ERROR_BODY: &str = r#"{"error":"failed to serialize error response"}"#;

pub trait Function {
    fn handle(&self, event: &FunctionUrlEvent) -> FunctionUrlResponse;
}

/// Page view counter behind a function url.
///
/// Reads the counter record, adds one and writes the whole record back. The read and the write
/// are two separate storage calls, so concurrent invocations may both read the same count and
/// one of the views gets lost.
pub struct CounterFunction<S> {
    table: Table<S>,
    counter_id: String,
}

impl<S: KVStorage> CounterFunction<S> {
    pub fn new(table: Table<S>, counter_id: impl Into<String>) -> Self {
        Self {
            table,
            counter_id: counter_id.into(),
        }
    }

    pub fn handle(&self, event: &FunctionUrlEvent) -> FunctionUrlResponse {
        let path = event.path();
        if path != ROOT_PATH {
            debug!(path, "skipping request to non-root path");
            return FunctionUrlResponse::no_content();
        }

        match self.increment().and_then(view_count_response) {
            Ok(v) => v,
            Err(err) => {
                error!(counter_id = %self.counter_id, "failed to count view: {err}");
                error_response(&err)
            }
        }
    }

    /// Returns the new view count.
    pub fn increment(&self) -> Result<u64, CounterError> {
        let current = match self.table.get_item(&self.counter_id)? {
            Some(item) => CounterRecord::from_item(self.counter_id.clone(), &item)?.view_count,
            None => 0,
        };

        let view_count = current.checked_add(1)
            .ok_or_else(|| CounterError::DataShape { reason: format!("view count {current} cannot be incremented") })?;

        self.table.put_item(&CounterRecord::new(self.counter_id.clone(), view_count).to_item())?;
        info!(table = self.table.name(), counter_id = %self.counter_id, view_count, "counted view");

        Ok(view_count)
    }
}

impl<S: KVStorage> Function for CounterFunction<S> {
    fn handle(&self, event: &FunctionUrlEvent) -> FunctionUrlResponse {
        CounterFunction::handle(self, event)
    }
}

fn view_count_response(view_count: u64) -> Result<FunctionUrlResponse, CounterError> {
    serde_json::to_string(&ViewCountBody { view_count })
        .map(|body| FunctionUrlResponse::json(StatusCode::OK, body))
        .map_err(|err| CounterError::Serialization { reason: err.to_string() })
}

fn error_response(err: &CounterError) -> FunctionUrlResponse {
    let body = serde_json::to_string(&ErrorBody { error: err.to_string() })
        .unwrap_or_else(|_| FALLBACK_ERROR_BODY.to_owned());
    FunctionUrlResponse::json(StatusCode::INTERNAL_SERVER_ERROR, body)
}
