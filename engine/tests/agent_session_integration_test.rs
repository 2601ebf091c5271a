//! End-to-end session tests
//!
//! A real `AgentCore` talks to a wiremock model backend and runs commands in
//! a temporary workspace.

#![cfg(unix)]

use open_coder_engine::agent::{AgentCore, Flow, HistoryStore, SessionContext, TurnSettings};
use open_coder_engine::command_executor::CommandExecutor;
use open_coder_engine::context::WorkspaceContext;
use open_coder_engine::llm::{ollama::OllamaProvider, Role, Turn};
use serde_json::json;
use std::io::Cursor;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Workspace {
    dir: TempDir,
    agent: AgentCore,
}

impl Workspace {
    fn new(server: &MockServer, history_limit: usize) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let session = SessionContext::new(dir.path(), Path::new(".open-coder")).unwrap();
        let backend = OllamaProvider::new(server.uri(), "llama3.1:8b").unwrap();
        let agent = AgentCore::new(
            session,
            Box::new(backend),
            CommandExecutor::new(dir.path()),
            WorkspaceContext::new(dir.path(), &[".open-coder".to_string()]),
            TurnSettings {
                prompt_template: "{{input}}".to_string(),
                history_limit,
                action_limit: 0,
            },
        );
        Self { dir, agent }
    }

    async fn send(&self, line: &str) -> String {
        let mut out = Vec::new();
        let flow = self.agent.handle_input(line, &mut out).await.unwrap();
        assert_eq!(flow, Flow::Continue);
        String::from_utf8(out).unwrap()
    }

    fn history(&self) -> Vec<Turn> {
        HistoryStore::load(self.agent.session().history_path(), 0)
            .unwrap()
            .turns()
            .to_vec()
    }
}

fn reply(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "message": {"role": "assistant", "content": content}
    }))
}

async fn mock_model(content: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(reply(content))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_fenced_reply_runs_every_command() {
    let server = mock_model(
        "<think>the user wants A and B</think>\n```json\n{\"commands\":[\"echo A\",\"false\",\"echo B\"],\"explanation\":\"demo\"}\n```",
    )
    .await;
    let ws = Workspace::new(&server, 0);

    let out = ws.send("print A and B").await;

    assert_eq!(
        out,
        "Executing commands:\n\
         > echo A\nA\n\
         > false\n(no output)\nError executing command 'false': exit status: 1\n\
         > echo B\nB\n\
         Done executing commands.\n\
         Explanation:\ndemo\n"
    );

    let history = ws.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0], Turn::user("print A and B"));
    assert_eq!(history[1].role, Role::Assistant);
    assert!(history[1].content.starts_with("<think>"));
}

#[tokio::test]
async fn test_commands_see_earlier_side_effects() {
    let server = mock_model(
        r#"{"commands":["mkdir -p out","echo data > out/file.txt","cat out/file.txt"]}"#,
    )
    .await;
    let ws = Workspace::new(&server, 0);

    let out = ws.send("write a file").await;

    assert!(out.contains("> cat out/file.txt\ndata\n"));
    assert!(ws.dir.path().join("out/file.txt").exists());
}

#[tokio::test]
async fn test_snapshot_written_and_state_dir_hidden() {
    let server = mock_model(r#"{"answer":"ok"}"#).await;
    let ws = Workspace::new(&server, 0);
    std::fs::write(ws.dir.path().join("main.rs"), "fn main() {}").unwrap();

    ws.send("what files exist?").await;

    let snapshot =
        std::fs::read_to_string(ws.agent.session().snapshot_path()).unwrap();
    assert!(snapshot.contains("main.rs"));
    assert!(!snapshot.contains("history.json"));

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = requests[0].body_json().unwrap();
    let system = body["messages"][0]["content"].as_str().unwrap();
    assert!(system.starts_with("Environment:\n"));
    assert!(system.contains("main.rs"));
}

#[tokio::test]
async fn test_history_is_bounded_across_turns() {
    let server = mock_model(r#"{"answer":"ok"}"#).await;
    let ws = Workspace::new(&server, 4);

    for i in 0..5 {
        ws.send(&format!("question {}", i)).await;
    }

    let history = ws.history();
    assert!(history.len() <= 4);
    assert_eq!(history.last().unwrap().role, Role::Assistant);
    assert_eq!(history[history.len() - 2], Turn::user("question 4"));
}

#[tokio::test]
async fn test_server_error_leaves_history_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_string("overloaded"))
        .mount(&server)
        .await;
    let ws = Workspace::new(&server, 0);

    let out = ws.send("hello").await;

    assert!(out.contains("500"));
    assert!(ws.history().is_empty());
    assert_eq!(
        std::fs::read_to_string(ws.agent.session().history_path()).unwrap(),
        "[]"
    );
}

#[tokio::test]
async fn test_prose_reply_shown_verbatim() {
    let server = mock_model("I cannot help with that.").await;
    let ws = Workspace::new(&server, 0);

    let out = ws.send("hello").await;

    assert_eq!(out, "I cannot help with that.\n");
    assert!(ws.history().is_empty());
}

#[tokio::test]
async fn test_direct_json_never_reaches_model() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(reply("unused"))
        .expect(0)
        .mount(&server)
        .await;
    let ws = Workspace::new(&server, 0);

    let out = ws.send(r#"{"commands":["echo direct"]}"#).await;

    assert!(out.contains("> echo direct\ndirect\n"));
    assert!(ws.history().is_empty());
}

#[tokio::test]
async fn test_clear_then_continue() {
    let server = mock_model(r#"{"answer":"ok"}"#).await;
    let ws = Workspace::new(&server, 0);

    ws.send("one").await;
    assert_eq!(ws.send("/clear").await, "Context history cleared.\n");
    assert!(ws.history().is_empty());

    ws.send("two").await;
    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = requests[1].body_json().unwrap();
    // system prompt plus the new request only
    assert_eq!(body["messages"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_clear_resets_truncated_history_file() {
    let server = mock_model(r#"{"answer":"ok"}"#).await;
    let ws = Workspace::new(&server, 0);
    let path = ws.agent.session().history_path();
    std::fs::write(path, "[{\"role\":\"assistant\",\"content\":\"half").unwrap();

    assert_eq!(ws.send("/clear").await, "Context history cleared.\n");
    assert_eq!(std::fs::read_to_string(path).unwrap(), "[]");
}

#[tokio::test]
async fn test_tiny_history_limit_trims_once_per_turn() {
    let server = mock_model(r#"{"answer":"ok"}"#).await;
    let ws = Workspace::new(&server, 1);

    ws.send("first").await;
    // 2 turns over a limit of 1: one pass drops ceil(0.4) = 1
    assert_eq!(ws.history().len(), 1);

    ws.send("second").await;
    // 3 turns: one pass drops ceil(0.6) = 1
    let history = ws.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0], Turn::user("second"));
}

#[tokio::test]
async fn test_session_loop_until_eof() {
    let server = mock_model(r#"{"answer":"Fine, thanks."}"#).await;
    let ws = Workspace::new(&server, 0);
    let mut out = Vec::new();

    ws.agent
        .run(Cursor::new("how are you?\n"), &mut out)
        .await
        .unwrap();

    assert_eq!(String::from_utf8(out).unwrap(), "> Fine, thanks.\n> \n");
}
