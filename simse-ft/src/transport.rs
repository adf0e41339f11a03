use std::io::{self, Write};

use serde::Serialize;

#[derive(Serialize)]
struct JsonRpcResponse<'a> {
    jsonrpc: &'a str,
    id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcErrorBody>,
}

#[derive(Serialize)]
struct JsonRpcErrorBody {
    code: i32,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct JsonRpcNotification<'a> {
    jsonrpc: &'a str,
    method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<serde_json::Value>,
}

/// Writes one JSON-RPC message per line. Defaults to stdout; any writer can
/// be supplied instead.
pub struct NdjsonTransport {
    out: Box<dyn Write>,
}

impl Default for NdjsonTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl NdjsonTransport {
    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }

    pub fn with_writer(out: impl Write + 'static) -> Self {
        Self { out: Box::new(out) }
    }

    pub fn write_response(&mut self, id: u64, result: serde_json::Value) {
        self.write_line(&JsonRpcResponse {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        });
    }

    pub fn write_error(
        &mut self,
        id: u64,
        code: i32,
        message: impl Into<String>,
        data: Option<serde_json::Value>,
    ) {
        self.write_line(&JsonRpcResponse {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(JsonRpcErrorBody {
                code,
                message: message.into(),
                data,
            }),
        });
    }

    pub fn write_notification(&mut self, method: &str, params: serde_json::Value) {
        self.write_line(&JsonRpcNotification {
            jsonrpc: "2.0",
            method,
            params: Some(params),
        });
    }

    fn write_line(&mut self, value: &impl Serialize) {
        let line = match serde_json::to_string(value) {
            Ok(line) => line,
            Err(e) => {
                tracing::error!("Failed to serialize: {}", e);
                return;
            }
        };
        if let Err(e) = writeln!(self.out, "{}", line).and_then(|_| self.out.flush()) {
            tracing::error!("Failed to write message: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct SharedBuf(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn lines(buf: &SharedBuf) -> Vec<serde_json::Value> {
        String::from_utf8(buf.0.borrow().clone())
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn response_and_error_lines() {
        let buf = SharedBuf::default();
        let mut transport = NdjsonTransport::with_writer(buf.clone());
        transport.write_response(1, serde_json::json!({"ok": true}));
        transport.write_error(2, -32601, "nope", None);

        let out = lines(&buf);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0]["id"], 1);
        assert_eq!(out[0]["result"]["ok"], true);
        assert!(out[0].get("error").is_none());
        assert_eq!(out[1]["error"]["code"], -32601);
        assert_eq!(out[1]["error"]["message"], "nope");
        assert!(out[1]["error"].get("data").is_none());
    }

    #[test]
    fn notification_has_no_id() {
        let buf = SharedBuf::default();
        let mut transport = NdjsonTransport::with_writer(buf.clone());
        transport.write_notification("tree/checkFailed", serde_json::json!({}));
        let out = lines(&buf);
        assert!(out[0].get("id").is_none());
        assert_eq!(out[0]["method"], "tree/checkFailed");
    }
}
