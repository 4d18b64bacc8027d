//! HTTP endpoint layer for the preprocessing pipeline
//! Simple HTTP server using tokio and basic HTTP handling; translates
//! POST /preprocess and POST /push_summary 1:1 onto the core operations.

use prepflow::config::PipelineConfig;
use prepflow::error::PipelineError;
use prepflow::pipeline::PreprocessPipeline;
use prepflow::push::SummaryUpserter;
use serde::Deserialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

lazy_static::lazy_static! {
    static ref CONFIG: PipelineConfig = PipelineConfig::from_env();
}

#[derive(Deserialize)]
struct PreprocessRequest {
    file_path: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    println!("Starting prepflow API server...");
    println!("Summary file: {}", CONFIG.summary_file().display());
    println!("Partition root: {}", CONFIG.output_root.display());

    let listener = TcpListener::bind(&CONFIG.bind_addr).await?;
    println!("[OK] Server listening on {}", CONFIG.bind_addr);

    loop {
        let (stream, _addr) = listener.accept().await?;
        tokio::spawn(handle_connection(stream));
    }
}

async fn handle_connection(mut stream: TcpStream) {
    use tokio::time::{timeout, Duration};

    let mut buffer = Vec::new();
    let mut chunk = [0; 8192];

    let read_result = timeout(Duration::from_secs(5), async {
        loop {
            match stream.read(&mut chunk).await {
                Ok(0) => break,
                Ok(n) => {
                    buffer.extend_from_slice(&chunk[..n]);
                    if let Ok(s) = std::str::from_utf8(&buffer) {
                        if let Some(headers_end) = s.find("\r\n\r\n") {
                            match extract_content_length(s) {
                                Some(length) => {
                                    if buffer.len() >= headers_end + 4 + length {
                                        break;
                                    }
                                }
                                None => break,
                            }
                        }
                    }
                    // Guard against unbounded request bodies
                    if buffer.len() > 1_000_000 {
                        break;
                    }
                }
                Err(e) => {
                    eprintln!("Failed to read from stream: {}", e);
                    return Err(e);
                }
            }
        }
        Ok(())
    })
    .await;

    if read_result.is_err() {
        eprintln!("[WARN] Request read timeout");
        return;
    }
    if buffer.is_empty() {
        return;
    }

    match String::from_utf8(buffer) {
        Ok(request) => {
            let response = handle_request(&request);
            if let Err(e) = stream.write_all(response.as_bytes()).await {
                eprintln!("Failed to write response: {}", e);
            }
        }
        Err(e) => {
            eprintln!("Failed to parse request as UTF-8: {}", e);
        }
    }
}

fn extract_content_length(request: &str) -> Option<usize> {
    for line in request.lines() {
        if line.to_lowercase().starts_with("content-length:") {
            if let Some(value) = line.split(':').nth(1) {
                return value.trim().parse().ok();
            }
        }
    }
    None
}

fn handle_request(request: &str) -> String {
    let request_line = match request.lines().next() {
        Some(line) => line,
        None => return create_response(400, "Bad Request", r#"{"error":"empty request"}"#),
    };
    let parts: Vec<&str> = request_line.split_whitespace().collect();
    if parts.len() < 2 {
        return create_response(400, "Bad Request", r#"{"error":"malformed request line"}"#);
    }

    let method = parts[0];
    let path = parts[1].trim_end_matches('/');
    let path = if path.is_empty() { "/" } else { path };

    match (method, path) {
        ("GET", "/health") => {
            create_response(200, "OK", r#"{"status":"ok","service":"prepflow"}"#)
        }
        ("POST", "/preprocess") => handle_preprocess(request),
        ("POST", "/push_summary") => handle_push(),
        _ => create_response(404, "Not Found", r#"{"error":"Not found"}"#),
    }
}

fn handle_preprocess(request: &str) -> String {
    let parsed: PreprocessRequest = match serde_json::from_str(extract_body(request)) {
        Ok(parsed) => parsed,
        Err(_) => PreprocessRequest { file_path: None },
    };

    let file_path = match parsed.file_path {
        Some(path) if !path.trim().is_empty() => path,
        _ => {
            return create_response(400, "Bad Request", r#"{"error":"File path not provided"}"#)
        }
    };

    let pipeline = PreprocessPipeline::new(CONFIG.clone());
    match pipeline.preprocess(&file_path) {
        Ok(report) => match serde_json::to_string(&report) {
            Ok(json) => create_response(200, "OK", &json),
            Err(e) => error_response(&PipelineError::Json(e)),
        },
        Err(e) => error_response(&e),
    }
}

fn handle_push() -> String {
    let upserter = SummaryUpserter::new(CONFIG.clone());
    match upserter.push() {
        Ok(report) => match serde_json::to_string(&report) {
            Ok(json) => create_response(200, "OK", &json),
            Err(e) => error_response(&PipelineError::Json(e)),
        },
        Err(e) => error_response(&e),
    }
}

fn extract_body(request: &str) -> &str {
    let body = match request.find("\r\n\r\n") {
        Some(start) => request[start + 4..].trim(),
        None => "",
    };
    match body.find('{') {
        Some(start) => &body[start..],
        None => "",
    }
}

fn error_response(err: &PipelineError) -> String {
    let (status, status_text) = match err {
        PipelineError::Input(_) | PipelineError::NotFound(_) => (404, "Not Found"),
        _ => (500, "Internal Server Error"),
    };
    let body = serde_json::json!({ "error": err.to_string() });
    create_response(status, status_text, &body.to_string())
}

fn create_response(status: u16, status_text: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {} {}\r\n\
         Content-Type: application/json\r\n\
         Content-Length: {}\r\n\
         \r\n\
         {}",
        status,
        status_text,
        body.len(),
        body
    )
}
