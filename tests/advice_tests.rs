// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use finwise::advice::{
    AdviceError, Advisor, MAX_ANSWER_CHARS, MSG_MALFORMED, MSG_UNAVAILABLE, OllamaClient,
    TRUNCATION_MARKER, advise, clip_answer, is_valid_question,
};
use finwise::config::AdviceConfig;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Serves one HTTP response and hands back the request body it received.
fn one_shot(status: &str, body: &str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let status = status.to_string();
    let body = body.to_string();
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut content_length = 0usize;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            if line == "\r\n" || line.is_empty() {
                break;
            }
            let lower = line.to_ascii_lowercase();
            if let Some(v) = lower.strip_prefix("content-length:") {
                content_length = v.trim().parse().unwrap();
            }
        }
        let mut request = vec![0u8; content_length];
        reader.read_exact(&mut request).unwrap();
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        stream.write_all(response.as_bytes()).unwrap();
        String::from_utf8(request).unwrap()
    });
    (format!("http://{}", addr), handle)
}

fn client(host: String) -> OllamaClient {
    OllamaClient::new(AdviceConfig {
        host,
        timeout: Duration::from_secs(5),
        ..AdviceConfig::default()
    })
    .unwrap()
}

#[test]
fn answer_is_returned_and_request_is_well_formed() {
    let (host, server) = one_shot(
        "200 OK",
        r#"{"model":"llama3:8b","message":{"role":"assistant","content":"Почніть з подушки безпеки."},"done":true}"#,
    );
    let answer = client(host).ask("З чого почати?").unwrap();
    assert_eq!(answer, "Почніть з подушки безпеки.");

    let request: serde_json::Value = serde_json::from_str(&server.join().unwrap()).unwrap();
    assert_eq!(request["model"], "llama3:8b");
    assert_eq!(request["stream"], false);
    assert_eq!(request["messages"][0]["role"], "system");
    assert_eq!(request["messages"][1]["content"], "З чого почати?");
}

#[test]
fn non_success_status_is_reported() {
    let (host, server) = one_shot("503 Service Unavailable", r#"{"error":"loading"}"#);
    let err = client(host).ask("Питання?").unwrap_err();
    assert!(matches!(err, AdviceError::Status { status: 503, .. }));
    assert_eq!(err.user_message(), MSG_UNAVAILABLE);
    server.join().unwrap();
}

#[test]
fn malformed_body_is_reported() {
    let (host, server) = one_shot("200 OK", "not json");
    let c = client(host);
    assert_eq!(advise(&c, "Питання?"), MSG_MALFORMED);
    server.join().unwrap();
}

#[test]
fn missing_content_is_empty() {
    let (host, server) = one_shot("200 OK", r#"{"done":true}"#);
    assert!(matches!(client(host).ask("Питання?"), Err(AdviceError::Empty)));
    server.join().unwrap();
}

#[test]
fn unreachable_service_is_a_connect_error() {
    // bind and drop to get a port nobody listens on
    let port = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let c = client(format!("http://127.0.0.1:{}", port));
    assert!(matches!(c.ask("Питання?"), Err(AdviceError::Connect(_))));
    assert!(!c.is_available());
}

#[test]
fn question_validation() {
    assert!(!is_valid_question(""));
    assert!(!is_valid_question(" a b "));
    assert!(is_valid_question("abc"));
    assert!(is_valid_question("Як?"));
}

#[test]
fn long_answers_are_clipped() {
    let long = "ф".repeat(MAX_ANSWER_CHARS + 50);
    let clipped = clip_answer(&long);
    assert!(clipped.ends_with(TRUNCATION_MARKER));
    assert_eq!(
        clipped.chars().count(),
        MAX_ANSWER_CHARS + TRUNCATION_MARKER.chars().count()
    );
    assert_eq!(clip_answer("коротко"), "коротко");
}
