//! Scripted in-process driver for integration tests.
//!
//! Speaks the real wire format over in-memory duplex pipes, so the tests
//! exercise the production transport and connection code end to end. The
//! driver answers every request, records what it saw, and can emulate a
//! network of intercepted requests or inject failures for chosen methods.

use parking_lot::Mutex;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream, duplex};

const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Makes the driver answer one method with a remote error.
#[derive(Clone)]
pub struct FailRule {
    pub method: String,
    pub name: String,
    pub message: String,
}

#[derive(Default)]
pub struct DriverConfig {
    /// URLs "fetched" during each navigation. Each produces request and
    /// response events; while interception is active it also produces a
    /// route event that must be resolved before the navigation completes.
    pub network: Vec<String>,
    pub fail: Option<FailRule>,
    pub title: String,
    /// Inner texts of the elements every selector query matches.
    pub elements: Vec<String>,
    /// Answer `initialize` without the engine object references.
    pub bare_initialize: bool,
}

/// Everything the driver observed, for assertions.
#[derive(Default)]
pub struct DriverState {
    /// The full `initialize` request frame.
    pub handshake: Option<Value>,
    /// GUIDs that received a close call, in order.
    pub close_log: Vec<String>,
    /// Params of every newContext call.
    pub context_options: Vec<Value>,
    /// Latest interception patterns.
    pub patterns: Vec<Value>,
    /// URLs resolved with continue, in network order.
    pub continued: Vec<String>,
    /// Params of every fulfill resolution.
    pub fulfilled: Vec<Value>,
    /// (url, errorCode) of every abort resolution.
    pub aborted: Vec<(String, String)>,
}

/// Spawns the scripted driver. Returns its observation log and the two pipe
/// ends for `Session::over_pipe` (client writer, client reader).
pub fn start_driver(config: DriverConfig) -> (Arc<Mutex<DriverState>>, DuplexStream, DuplexStream) {
    let (client_writer, driver_reader) = duplex(1 << 20);
    let (driver_writer, client_reader) = duplex(1 << 20);

    let state = Arc::new(Mutex::new(DriverState::default()));
    let task_state = Arc::clone(&state);
    tokio::spawn(async move {
        drive(config, task_state, driver_reader, driver_writer).await;
    });

    (state, client_writer, client_reader)
}

async fn read_frame(reader: &mut DuplexStream) -> Option<Value> {
    let mut length_buf = [0u8; 4];
    reader.read_exact(&mut length_buf).await.ok()?;
    let mut payload = vec![0u8; u32::from_le_bytes(length_buf) as usize];
    reader.read_exact(&mut payload).await.ok()?;
    serde_json::from_slice(&payload).ok()
}

async fn write_frame(writer: &mut DuplexStream, message: &Value) {
    let payload = serde_json::to_vec(message).unwrap();
    writer
        .write_all(&(payload.len() as u32).to_le_bytes())
        .await
        .unwrap();
    writer.write_all(&payload).await.unwrap();
}

fn encode_base64(bytes: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

async fn drive(
    config: DriverConfig,
    state: Arc<Mutex<DriverState>>,
    mut reader: DuplexStream,
    mut writer: DuplexStream,
) {
    let mut object_seq = 0u32;
    let mut route_seq = 0u32;
    let mut interception = false;

    while let Some(request) = read_frame(&mut reader).await {
        let Some(id) = request["id"].as_u64() else {
            continue;
        };
        let guid = request["guid"].as_str().unwrap_or("").to_string();
        let method = request["method"].as_str().unwrap_or("").to_string();
        let params = request["params"].clone();

        if let Some(rule) = &config.fail {
            if rule.method == method {
                let error = json!({
                    "id": id,
                    "error": { "error": { "message": rule.message, "name": rule.name } },
                });
                write_frame(&mut writer, &error).await;
                continue;
            }
        }

        let result = match method.as_str() {
            "initialize" => {
                state.lock().handshake = Some(request.clone());
                if config.bare_initialize {
                    json!({ "playwright": { "guid": "playwright@1" } })
                } else {
                    json!({
                        "playwright": {
                            "guid": "playwright@1",
                            "chromium": { "guid": "browser-type@chromium" },
                            "firefox": { "guid": "browser-type@firefox" },
                            "webkit": { "guid": "browser-type@webkit" },
                        }
                    })
                }
            }
            "launch" => {
                object_seq += 1;
                json!({ "browser": { "guid": format!("browser@{object_seq}") } })
            }
            "newContext" => {
                object_seq += 1;
                state.lock().context_options.push(params.clone());
                json!({ "context": { "guid": format!("context@{object_seq}") } })
            }
            "newPage" => {
                object_seq += 1;
                json!({ "page": { "guid": format!("page@{object_seq}") } })
            }
            "setNetworkInterceptionPatterns" => {
                let patterns = params["patterns"].as_array().cloned().unwrap_or_default();
                interception = !patterns.is_empty();
                state.lock().patterns = patterns;
                json!({})
            }
            "goto" => {
                for url in &config.network {
                    let request_event = json!({
                        "guid": guid,
                        "method": "request",
                        "params": {
                            "request": {
                                "url": url,
                                "method": "GET",
                                "resourceType": "document",
                                "headers": {},
                            },
                        },
                    });
                    write_frame(&mut writer, &request_event).await;

                    if interception {
                        route_seq += 1;
                        let route_guid = format!("route@{route_seq}");
                        let route_event = json!({
                            "guid": guid,
                            "method": "route",
                            "params": {
                                "route": { "guid": route_guid },
                                "request": {
                                    "url": url,
                                    "method": "GET",
                                    "resourceType": "document",
                                    "headers": {},
                                },
                            },
                        });
                        write_frame(&mut writer, &route_event).await;

                        // Navigation stalls until the client resolves the route.
                        let Some(resolution) = read_frame(&mut reader).await else {
                            return;
                        };
                        let resolution_id = resolution["id"].as_u64().unwrap();
                        match resolution["method"].as_str().unwrap_or("") {
                            "continue" => state.lock().continued.push(url.clone()),
                            "fulfill" => state.lock().fulfilled.push(resolution["params"].clone()),
                            "abort" => state.lock().aborted.push((
                                url.clone(),
                                resolution["params"]["errorCode"]
                                    .as_str()
                                    .unwrap_or("")
                                    .to_string(),
                            )),
                            other => panic!("unexpected route resolution: {other}"),
                        }
                        write_frame(&mut writer, &json!({ "id": resolution_id, "result": {} }))
                            .await;
                    }

                    let response_event = json!({
                        "guid": guid,
                        "method": "response",
                        "params": { "response": { "url": url, "status": 200 } },
                    });
                    write_frame(&mut writer, &response_event).await;
                }

                let navigated = json!({
                    "guid": guid,
                    "method": "navigated",
                    "params": { "url": params["url"] },
                });
                write_frame(&mut writer, &navigated).await;
                json!({})
            }
            "evaluateExpression" => {
                let options = state.lock().context_options.last().cloned().unwrap_or(json!({}));
                let viewport = options
                    .get("viewport")
                    .cloned()
                    .unwrap_or(json!({ "width": 1280, "height": 720 }));
                json!({
                    "value": {
                        "width": viewport["width"],
                        "height": viewport["height"],
                        "deviceScaleFactor": options
                            .get("deviceScaleFactor")
                            .cloned()
                            .unwrap_or(json!(1.0)),
                    }
                })
            }
            "querySelectorAll" => {
                let elements: Vec<Value> = (1..=config.elements.len())
                    .map(|i| json!({ "guid": format!("element@{i}") }))
                    .collect();
                json!({ "elements": elements })
            }
            "querySelector" => {
                // On an element handle, resolve to a synthetic child; on the
                // page, to the first configured element.
                if let Some(index) = guid.strip_prefix("element@") {
                    json!({ "element": { "guid": format!("element@{index}/child") } })
                } else if config.elements.is_empty() {
                    json!({})
                } else {
                    json!({ "element": { "guid": "element@1" } })
                }
            }
            "innerText" => {
                let text = guid
                    .strip_prefix("element@")
                    .and_then(|rest| rest.split('/').next())
                    .and_then(|digits| digits.parse::<usize>().ok())
                    .and_then(|index| index.checked_sub(1))
                    .and_then(|index| config.elements.get(index))
                    .cloned()
                    .unwrap_or_default();
                json!({ "value": text })
            }
            "video" => {
                let options = state.lock().context_options.last().cloned().unwrap_or(json!({}));
                match options["recordVideoDir"].as_str() {
                    Some(dir) => json!({ "path": format!("{dir}/{guid}.webm") }),
                    None => json!({}),
                }
            }
            "title" => json!({ "value": config.title }),
            "screenshot" => json!({ "binary": encode_base64(PNG_MAGIC) }),
            "pdf" => json!({ "binary": encode_base64(b"%PDF-1.4 fake") }),
            "close" => {
                state.lock().close_log.push(guid.clone());
                json!({})
            }
            // click, fill, press, reload and anything else succeed silently.
            _ => json!({}),
        };

        write_frame(&mut writer, &json!({ "id": id, "result": result })).await;
    }
}
