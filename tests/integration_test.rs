/// End-to-end integration tests for the vaultrag pipeline.
///
/// Tests the complete flow:
///   Config → Vault → Chunker → Embedder → Index → Prompt → Model
///
/// Hosted services are replaced by a one-shot local HTTP responder.
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;

use serde_json::json;
use tempfile::tempdir;

use vaultrag::RagError;
use vaultrag::chunker::Chunker;
use vaultrag::config::{Config, EmbedderKind};
use vaultrag::document::Document;
use vaultrag::embedder::Embedder;
use vaultrag::embedder::hash::HashEmbedder;
use vaultrag::embedder::openai::OpenAiEmbedder;
use vaultrag::index::{IndexBackend, MemoryIndex, SqliteIndex, VectorIndex};
use vaultrag::llm::{LanguageModel, OpenAiChatModel};
use vaultrag::pipeline::Pipeline;
use vaultrag::source::{DocumentSource, VaultSource};
use vaultrag::trace::{LangSmithSink, RunRecord, TraceSink};

// ── Mock HTTP server ─────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Recorded {
    /// Request line and headers, lower-cased.
    head: String,
    body: String,
}

struct MockServer {
    url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
    handle: thread::JoinHandle<()>,
}

impl MockServer {
    /// Serve `responses` in order, one connection each.
    fn start(responses: Vec<(u16, String)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/v1", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let log = requests.clone();

        let handle = thread::spawn(move || {
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().unwrap();
                let recorded = read_request(&mut stream);
                log.lock().unwrap().push(recorded);

                let resp = format!(
                    "HTTP/1.1 {status} Mock\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                stream.write_all(resp.as_bytes()).unwrap();
                stream.flush().unwrap();
            }
        });

        Self {
            url,
            requests,
            handle,
        }
    }

    fn finish(self) -> Vec<Recorded> {
        self.handle.join().unwrap();
        Arc::try_unwrap(self.requests)
            .unwrap()
            .into_inner()
            .unwrap()
    }
}

fn read_request(stream: &mut std::net::TcpStream) -> Recorded {
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut head = String::new();
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
        head.push_str(&lower);
    }

    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).unwrap();
    Recorded {
        head,
        body: String::from_utf8(body).unwrap(),
    }
}

fn chat_reply(text: &str) -> String {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": text},
            "finish_reason": "stop"
        }]
    })
    .to_string()
}

fn test_config(base_url: &str, vault: &std::path::Path) -> Config {
    let mut cfg = Config::default();
    cfg.apply_env(|key| match key {
        "OPENAI_API_KEY" => Some("sk-test".to_string()),
        _ => None,
    });
    cfg.openai.base_url = base_url.to_string();
    cfg.openai.timeout_secs = 10;
    cfg.vault_path = Some(vault.to_string_lossy().to_string());
    cfg.embedder = EmbedderKind::Hash;
    cfg
}

// ── End to end ───────────────────────────────────────────────────────

/// Single-note vault: the answer comes back through the chat client.
#[test]
fn test_meaning_of_life_end_to_end() {
    let vault = tempdir().unwrap();
    std::fs::write(vault.path().join("life.md"), "The meaning of life is 42.").unwrap();

    let server = MockServer::start(vec![(200, chat_reply("The meaning of life is 42."))]);
    let cfg = test_config(&server.url, vault.path());
    cfg.validate().unwrap();

    let docs = VaultSource::new(vault.path(), &cfg.extensions).load().unwrap();
    let mut pipeline = Pipeline::from_config(&cfg).unwrap();
    assert_eq!(pipeline.ingest(&docs).unwrap(), 1);

    let answer = pipeline.answer("What is the meaning of life?").unwrap();
    assert!(answer.text.contains("42"), "got: {}", answer.text);
    assert!(answer.sources()[0].ends_with("life.md"));

    let requests = server.finish();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].head.starts_with("post /v1/chat/completions"));
    assert!(requests[0].head.contains("authorization: bearer sk-test"));

    let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(body["model"], "gpt-3.5-turbo");
    assert_eq!(body["temperature"], 0.0);
    let prompt = body["messages"][0]["content"].as_str().unwrap();
    assert!(prompt.contains("Question: What is the meaning of life?"));
    assert!(prompt.contains("Context: The meaning of life is 42."));
}

/// Same flow through the SQLite index with a multi-note vault.
#[test]
fn test_sqlite_backend_end_to_end() {
    let vault = tempdir().unwrap();
    std::fs::write(vault.path().join("cats.md"), "Cats sleep most of the day.").unwrap();
    std::fs::write(
        vault.path().join("life.md"),
        "---\ntags: [philosophy]\n---\nThe meaning of life is 42.",
    )
    .unwrap();
    std::fs::write(vault.path().join("rust.txt"), "Rust has no garbage collector.").unwrap();

    let server = MockServer::start(vec![(200, chat_reply("42"))]);
    let mut cfg = test_config(&server.url, vault.path());
    cfg.index_backend = IndexBackend::Sqlite;
    cfg.search_top_k = 1;

    let docs = VaultSource::new(vault.path(), &cfg.extensions).load().unwrap();
    assert_eq!(docs.len(), 3);

    let mut pipeline = Pipeline::from_config(&cfg).unwrap();
    pipeline.ingest(&docs).unwrap();
    let answer = pipeline.answer("What is the meaning of life?").unwrap();

    assert_eq!(answer.text, "42");
    assert_eq!(answer.context.len(), 1);
    assert_eq!(answer.context[0].chunk.content, "The meaning of life is 42.");
    assert_eq!(
        answer.context[0].chunk.metadata["tags"].to_string(),
        "philosophy"
    );
    server.finish();
}

/// Retrieval-only runs need no chat model.
#[test]
fn test_retrieve_only_builds_prompt() {
    let vault = tempdir().unwrap();
    std::fs::write(vault.path().join("life.md"), "The meaning of life is 42.").unwrap();

    let mut cfg = Config::default();
    cfg.vault_path = Some(vault.path().to_string_lossy().to_string());
    cfg.embedder = EmbedderKind::Hash;
    cfg.retrieve_only = true;
    cfg.validate().unwrap();

    let docs = VaultSource::new(vault.path(), &cfg.extensions).load().unwrap();
    let mut pipeline = Pipeline::from_config(&cfg).unwrap();
    pipeline.ingest(&docs).unwrap();

    let prepared = pipeline.prepare("meaning of life").unwrap();
    assert!(prepared.prompt.contains("The meaning of life is 42."));
}

/// An empty vault surfaces as an empty-index error on the first query.
#[test]
fn test_empty_vault() {
    let vault = tempdir().unwrap();
    let server = MockServer::start(vec![]);
    let cfg = test_config(&server.url, vault.path());

    let docs = VaultSource::new(vault.path(), &cfg.extensions).load().unwrap();
    assert!(docs.is_empty());

    let mut pipeline = Pipeline::from_config(&cfg).unwrap();
    assert_eq!(pipeline.ingest(&docs).unwrap(), 0);
    assert!(matches!(
        pipeline.answer("anything?"),
        Err(RagError::EmptyIndex)
    ));
    assert!(server.finish().is_empty());
}

// ── Hosted clients ───────────────────────────────────────────────────

#[test]
fn test_chat_model_auth_failure() {
    let server = MockServer::start(vec![(
        401,
        json!({"error": {"message": "Incorrect API key provided"}}).to_string(),
    )]);
    let mut cfg = Config::default();
    cfg.openai.api_key = Some("sk-bad".to_string());
    cfg.openai.base_url = server.url.clone();

    let model = OpenAiChatModel::new(&cfg.openai).unwrap();
    let err = model.complete("hi", "gpt-3.5-turbo", 0.0).unwrap_err();
    match err {
        RagError::Service(msg) => assert!(msg.contains("401"), "{msg}"),
        other => panic!("expected service error, got {other:?}"),
    }
    server.finish();
}

#[test]
fn test_openai_embedder_batches() {
    let server = MockServer::start(vec![
        (
            200,
            json!({"data": [
                {"index": 1, "embedding": [0.0, 1.0]},
                {"index": 0, "embedding": [1.0, 0.0]}
            ]})
            .to_string(),
        ),
        (
            200,
            json!({"data": [{"index": 0, "embedding": [0.5, 0.5]}]}).to_string(),
        ),
    ]);

    let mut cfg = Config::default();
    cfg.openai.api_key = Some("sk-test".to_string());
    cfg.openai.base_url = server.url.clone();
    cfg.openai.embedding_dimensions = 2;
    cfg.openai.embedding_batch_size = 2;

    let embedder = OpenAiEmbedder::new(&cfg.openai).unwrap();
    let vectors = embedder.embed_batch(&["a", "b", "c"]).unwrap();
    assert_eq!(
        vectors,
        vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.5, 0.5]]
    );

    let requests = server.finish();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].head.starts_with("post /v1/embeddings"));
    let first: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(first["model"], "text-embedding-3-small");
    assert_eq!(first["input"], json!(["a", "b"]));
    let second: serde_json::Value = serde_json::from_str(&requests[1].body).unwrap();
    assert_eq!(second["input"], json!(["c"]));
}

#[test]
fn test_langsmith_sink_posts_run() {
    let server = MockServer::start(vec![(200, "{}".to_string())]);
    let mut cfg = Config::default();
    cfg.tracing.enabled = true;
    cfg.tracing.api_key = Some("ls-test".to_string());
    cfg.tracing.endpoint = server.url.clone();
    cfg.tracing.project = "vault".to_string();

    let sink = LangSmithSink::new(&cfg.tracing).unwrap();
    let mut run = RunRecord::start("vaultrag.answer", json!({"question": "q"}));
    run.finish(Ok(json!({"answer": "a"})));
    sink.submit(&run).unwrap();

    let requests = server.finish();
    assert!(requests[0].head.starts_with("post /v1/runs"));
    assert!(requests[0].head.contains("x-api-key: ls-test"));
    let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(body["session_name"], "vault");
    assert_eq!(body["name"], "vaultrag.answer");
    assert_eq!(body["id"], run.id.to_string());
}

// ── Retrieval properties ─────────────────────────────────────────────

fn long_note() -> Document {
    let text: String = (0..60)
        .map(|i| format!("Entry {i} records topic{i} with detail{}. ", i * 7))
        .collect();
    Document::new(text)
}

fn self_retrieval(mut index: Box<dyn VectorIndex>) {
    let embedder = HashEmbedder::default();
    let chunker = Chunker::new(200, 50).unwrap();
    let chunks: Vec<_> = chunker.chunks(&long_note()).collect();
    assert!(chunks.len() > 5);

    let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
    let vectors = embedder.embed_batch(&texts).unwrap();
    let c3 = chunks[2].clone();
    index.add(chunks, vectors).unwrap();

    let query = embedder.embed(&c3.content).unwrap();
    let top = index.query(&query, 1).unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].chunk.content, c3.content);
    assert_eq!(top[0].chunk.position, 2);
}

#[test]
fn test_self_retrieval_memory() {
    self_retrieval(Box::new(MemoryIndex::new()));
}

#[test]
fn test_self_retrieval_sqlite() {
    self_retrieval(Box::new(SqliteIndex::open_in_memory().unwrap()));
}

#[test]
fn test_embedding_determinism() {
    let embedder = HashEmbedder::default();
    let a = embedder.embed("The meaning of life is 42.").unwrap();
    let b = embedder.embed("The meaning of life is 42.").unwrap();
    assert_eq!(a, b);
    assert!(vaultrag::index::cosine_distance(&a, &b).abs() < 1e-6);
}

#[test]
fn test_chunker_rejects_overlap() {
    for w in 1..50 {
        assert!(matches!(
            Chunker::new(w, w),
            Err(RagError::Configuration(_))
        ));
    }
}
