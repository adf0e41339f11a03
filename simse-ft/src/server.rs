// ---------------------------------------------------------------------------
// FtServer: JSON-RPC dispatcher
// ---------------------------------------------------------------------------
//
// Routes incoming JSON-RPC 2.0 requests (NDJSON over stdin) to FileTree
// operations: a main `run()` loop, a `dispatch()` that writes the reply, and
// `call()` which maps a method name to a handler.
// ---------------------------------------------------------------------------

use std::io::{self, BufRead};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::error::ServerError;
use crate::protocol::*;
use crate::transport::NdjsonTransport;
use crate::tree::FileTree;

#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
	pub check_after_mutation: bool,
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// JSON-RPC server that dispatches requests to a [`FileTree`].
pub struct FtServer {
	transport: NdjsonTransport,
	tree: FileTree,
	config: ServerConfig,
}

impl FtServer {
	pub fn new(transport: NdjsonTransport, tree: FileTree, config: ServerConfig) -> Self {
		Self {
			transport,
			tree,
			config,
		}
	}

	pub fn tree(&self) -> &FileTree {
		&self.tree
	}

	/// Main loop: read JSON-RPC messages from stdin, dispatch to handlers.
	pub fn run(&mut self) -> Result<(), ServerError> {
		let stdin = io::stdin();
		self.serve(stdin.lock())
	}

	/// Serve every line of `reader` until EOF.
	pub fn serve(&mut self, reader: impl BufRead) -> Result<(), ServerError> {
		for line_result in reader.lines() {
			let line = line_result?;
			let trimmed = line.trim();
			if trimmed.is_empty() {
				continue;
			}

			match serde_json::from_str::<JsonRpcRequest>(trimmed) {
				Ok(req) => self.dispatch(req),
				Err(e) => {
					tracing::warn!("Parse error: {}", e);
					self.transport
						.write_error(0, PARSE_ERROR, "Parse error: invalid JSON", None);
				}
			}
		}

		Ok(())
	}

	// ── Dispatch ──────────────────────────────────────────────────────────

	fn dispatch(&mut self, req: JsonRpcRequest) {
		let id = req.id;
		tracing::debug!(id, method = %req.method, "request");

		match self.call(&req.method, req.params) {
			Ok(value) => self.transport.write_response(id, value),
			Err(ServerError::Tree(e)) => self.transport.write_error(
				id,
				FT_ERROR,
				e.to_string(),
				Some(e.to_json_rpc_error()),
			),
			Err(e @ ServerError::InvalidParams(_)) => {
				self.transport
					.write_error(id, INVALID_PARAMS, e.to_string(), None)
			}
			Err(e @ ServerError::MethodNotFound(_)) => {
				self.transport
					.write_error(id, METHOD_NOT_FOUND, e.to_string(), None)
			}
			Err(e @ (ServerError::Io(_) | ServerError::Json(_))) => {
				self.transport
					.write_error(id, INTERNAL_ERROR, e.to_string(), None)
			}
		}
	}

	/// Run one method against the tree and return its JSON result.
	pub fn call(
		&mut self,
		method: &str,
		params: serde_json::Value,
	) -> Result<serde_json::Value, ServerError> {
		let (result, mutated) = match method {
			// -- Lifecycle -----------------------------------------------
			"tree/initialize" => {
				self.tree.init()?;
				(serde_json::json!({}), false)
			}
			"tree/destroy" => {
				self.tree.destroy()?;
				(serde_json::json!({}), false)
			}

			// -- Mutation ------------------------------------------------
			"tree/insertDir" => {
				let p: PathParams = parse_params(params)?;
				self.tree.insert_directory(&p.path)?;
				(serde_json::json!({}), true)
			}
			"tree/insertFile" => {
				let p: ContentsParams = parse_params(params)?;
				let data = decode_contents(p.contents.as_deref())?;
				self.tree.insert_file(&p.path, &data)?;
				(serde_json::json!({}), true)
			}
			"tree/removeDir" => {
				let p: PathParams = parse_params(params)?;
				self.tree.remove_directory(&p.path)?;
				(serde_json::json!({}), true)
			}
			"tree/removeFile" => {
				let p: PathParams = parse_params(params)?;
				self.tree.remove_file(&p.path)?;
				(serde_json::json!({}), true)
			}
			"tree/replaceContents" => {
				let p: ContentsParams = parse_params(params)?;
				let data = decode_contents(p.contents.as_deref())?;
				let previous = self.tree.replace_file_contents(&p.path, &data);
				let mutated = previous.is_some();
				let result = ReplaceResult {
					previous: previous.map(|old| BASE64.encode(old)),
				};
				(to_value(result)?, mutated)
			}

			// -- Lookup --------------------------------------------------
			"tree/containsDir" => {
				let p: PathParams = parse_params(params)?;
				let result = ContainsResult {
					contains: self.tree.contains_directory(&p.path),
				};
				(to_value(result)?, false)
			}
			"tree/containsFile" => {
				let p: PathParams = parse_params(params)?;
				let result = ContainsResult {
					contains: self.tree.contains_file(&p.path),
				};
				(to_value(result)?, false)
			}
			"tree/getContents" => {
				let p: PathParams = parse_params(params)?;
				let result = ContentsResult {
					contents: self.tree.get_file_contents(&p.path).map(|d| BASE64.encode(d)),
				};
				(to_value(result)?, false)
			}
			"tree/stat" => {
				let p: PathParams = parse_params(params)?;
				let stat = self.tree.stat(&p.path)?;
				let result = StatResult {
					is_file: stat.is_file,
					size: stat.size,
				};
				(to_value(result)?, false)
			}
			"tree/toString" => {
				let result = RenderResult {
					text: self.tree.render(),
				};
				(to_value(result)?, false)
			}
			"tree/check" => {
				let result = CheckResult {
					valid: self.tree.check(),
					node_count: self.tree.node_count(),
				};
				(to_value(result)?, false)
			}

			// -- Unknown -------------------------------------------------
			_ => return Err(ServerError::MethodNotFound(method.to_string())),
		};

		if mutated && self.config.check_after_mutation {
			self.verify(method);
		}
		Ok(result)
	}

	fn verify(&mut self, method: &str) {
		if self.tree.check() {
			return;
		}
		tracing::warn!(method, "file tree failed structural check");
		self.transport.write_notification(
			CHECK_FAILED_NOTIFICATION,
			serde_json::json!({
				"method": method,
				"nodeCount": self.tree.node_count(),
			}),
		);
	}
}

// ---------------------------------------------------------------------------
// Param helpers
// ---------------------------------------------------------------------------

fn parse_params<T: serde::de::DeserializeOwned>(
	params: serde_json::Value,
) -> Result<T, ServerError> {
	serde_json::from_value(params).map_err(|e| ServerError::InvalidParams(e.to_string()))
}

fn to_value(value: impl serde::Serialize) -> Result<serde_json::Value, ServerError> {
	Ok(serde_json::to_value(value)?)
}

fn decode_contents(contents: Option<&str>) -> Result<Vec<u8>, ServerError> {
	match contents {
		Some(encoded) => BASE64
			.decode(encoded)
			.map_err(|e| ServerError::InvalidParams(format!("contents: {}", e))),
		None => Ok(Vec::new()),
	}
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
