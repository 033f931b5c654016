use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use frd_core::seed::seed_records;
use frd_core::{
    DashboardConfig, FeedbackManager, HttpSource, HttpUpdateSink, RecordSource, SeedSource,
    SimulatedRoundTrip, UpdateSink,
};
use frd_events::Bus;
use frd_model::{decode_attachment, default_download_name, EditDraft, PickedFile};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

mod command;
mod render;

use command::Command;

#[derive(Debug, Parser)]
#[command(
    name = "frd-dashboard",
    version,
    about = "Terminal view over a feedback review collection"
)]
struct Args {
    /// TOML config file; FRD_* variables and flags override it
    #[arg(long, env = "FRD_CONFIG")]
    config: Option<PathBuf>,
    #[arg(long, env = "FRD_ENDPOINT")]
    endpoint: Option<String>,
    #[arg(long, env = "FRD_TOKEN")]
    token: Option<String>,
    #[arg(long)]
    page_size: Option<usize>,
    /// Use the built-in seed records instead of the endpoint
    #[arg(long, default_value_t = false)]
    seed: bool,
    /// Accept edits locally after a delay instead of sending PATCH requests
    #[arg(long, default_value_t = false)]
    simulate: bool,
    /// Print the page view as JSON instead of text
    #[arg(long, default_value_t = false)]
    json: bool,
    /// Render the first page and exit
    #[arg(long, default_value_t = false)]
    once: bool,
}

impl Args {
    fn config(&self) -> Result<DashboardConfig> {
        let mut cfg = DashboardConfig::resolve(self.config.as_deref())
            .context("resolving dashboard config")?;
        if let Some(endpoint) = &self.endpoint {
            cfg.endpoint = endpoint.clone();
        }
        if let Some(token) = &self.token {
            cfg.token = Some(token.clone());
        }
        if let Some(size) = self.page_size {
            anyhow::ensure!(size > 0, "--page-size must be at least 1");
            cfg.page_size = size;
        }
        if self.simulate || self.seed {
            cfg.simulate_updates = true;
        }
        Ok(cfg)
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

struct Session {
    mgr: FeedbackManager,
    source: Box<dyn RecordSource>,
    draft: Option<EditDraft>,
    json: bool,
}

impl Session {
    fn new(mgr: FeedbackManager, source: Box<dyn RecordSource>, json: bool) -> Self {
        Self {
            mgr,
            source,
            draft: None,
            json,
        }
    }

    async fn reload(&self) -> Vec<String> {
        match self.mgr.load(self.source.as_ref()).await {
            Ok(_) => Vec::new(),
            Err(err) => vec![format!("load: {err}")],
        }
    }

    async fn screen(&self) -> Result<Vec<String>> {
        let view = self.mgr.view().await;
        if self.json {
            return Ok(vec![serde_json::to_string_pretty(&view)?]);
        }
        let mut lines = render::render_view(&view);
        if let Some(draft) = &self.draft {
            lines.extend(render::render_draft(draft));
        }
        Ok(lines)
    }

    /// Drops the local draft once the manager no longer edits its record.
    async fn sync_draft(&mut self) {
        let editing = self.mgr.snapshot().await.editing_id().map(str::to_string);
        if self.draft.as_ref().map(|d| &d.record_id) != editing.as_ref() {
            self.draft = None;
        }
    }

    fn draft_mut(&mut self) -> Result<&mut EditDraft, String> {
        self.draft
            .as_mut()
            .ok_or_else(|| "nothing is being edited (use `edit <id>`)".to_string())
    }

    async fn handle(&mut self, cmd: Command) -> Result<(Vec<String>, Flow)> {
        let mut notes = Vec::new();
        match cmd {
            Command::Quit => return Ok((Vec::new(), Flow::Quit)),
            Command::Help => {
                return Ok((command::HELP.iter().map(|s| s.to_string()).collect(), Flow::Continue))
            }
            Command::Show => {}
            Command::Retry => notes.extend(self.reload().await),
            Command::Open(id) => {
                self.mgr.toggle_open(&id).await;
            }
            Command::Search(text) => self.mgr.set_search(&text).await,
            Command::Status(label) => self.mgr.set_status_filter(&label).await,
            Command::Page(n) => self.mgr.set_page(n).await,
            Command::Next => self.mgr.next_page().await,
            Command::Prev => self.mgr.prev_page().await,
            Command::Delete(id) => {
                if !self.mgr.request_delete(&id).await {
                    notes.push(format!("#{id} cannot be deleted right now"));
                }
            }
            Command::Confirm(id) => {
                if !self.mgr.confirm_delete(&id).await {
                    notes.push(format!("#{id} is not awaiting confirmation"));
                }
            }
            Command::Cancel(id) => {
                self.mgr.cancel_delete(&id).await;
            }
            Command::Edit(id) => match self.mgr.begin_edit(&id).await {
                Ok(draft) => self.draft = Some(draft),
                Err(err) => notes.push(format!("edit: {err}")),
            },
            Command::Message(text) => match self.draft_mut() {
                Ok(draft) => draft.set_content(text),
                Err(msg) => notes.push(msg),
            },
            Command::Tags(text) => match self.draft_mut() {
                Ok(draft) => draft.set_metadata_text(text),
                Err(msg) => notes.push(msg),
            },
            Command::Attach(path) => notes.extend(self.attach(&path).await),
            Command::Detach => match self.draft_mut() {
                Ok(draft) => draft.detach(),
                Err(msg) => notes.push(msg),
            },
            Command::Save => match self.draft.clone() {
                Some(draft) => {
                    if let Err(err) = self.mgr.submit_edit(&draft).await {
                        notes.push(format!("save: {err}"));
                    }
                }
                None => notes.push("nothing is being edited (use `edit <id>`)".to_string()),
            },
            Command::Discard => {
                if let Some(draft) = self.draft.take() {
                    self.mgr.cancel_edit(&draft.record_id).await;
                }
            }
            Command::Download { id, path } => notes.extend(self.download(&id, path).await),
        }
        self.sync_draft().await;
        let mut lines = self.screen().await?;
        lines.extend(notes);
        Ok((lines, Flow::Continue))
    }

    async fn attach(&mut self, path: &Path) -> Vec<String> {
        let draft = match self.draft_mut() {
            Ok(draft) => draft,
            Err(msg) => return vec![msg],
        };
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(err) => return vec![format!("attach: reading {}: {err}", path.display())],
        };
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match draft.attach(PickedFile::new(name, bytes)) {
            Ok(()) => Vec::new(),
            Err(err) => vec![format!("attach: {err}")],
        }
    }

    async fn download(&self, id: &str, path: Option<PathBuf>) -> Vec<String> {
        let snapshot = self.mgr.snapshot().await;
        let Some(encoded) = snapshot.get(id).and_then(|r| r.file.clone()) else {
            return vec![format!("#{id} has no attachment")];
        };
        let bytes = match decode_attachment(&encoded) {
            Ok(bytes) => bytes,
            Err(err) => return vec![format!("download: {err}")],
        };
        let target = path.unwrap_or_else(|| PathBuf::from(default_download_name(id)));
        match tokio::fs::write(&target, &bytes).await {
            Ok(()) => vec![format!("saved {} bytes to {}", bytes.len(), target.display())],
            Err(err) => vec![format!("download: writing {}: {err}", target.display())],
        }
    }
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}

fn spawn_notices(bus: &Bus) -> tokio::task::JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(env) => {
                    if let Some(line) = render::notice_line(&env) {
                        eprintln!("[{}] {}", Local::now().format("%H:%M:%S"), line);
                    }
                }
                Err(RecvError::Lagged(n)) => tracing::debug!(skipped = n, "notice stream lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    frd_otel::init();
    let args = Args::parse();
    let cfg = args.config()?;

    let sink: Arc<dyn UpdateSink> = if cfg.simulate_updates {
        Arc::new(SimulatedRoundTrip::new(cfg.update_delay()))
    } else {
        Arc::new(HttpUpdateSink::from_config(&cfg)?)
    };
    let source: Box<dyn RecordSource> = if args.seed {
        Box::new(SeedSource::new(seed_records()))
    } else {
        Box::new(HttpSource::from_config(&cfg)?)
    };
    let bus = Bus::default();
    let mgr = FeedbackManager::from_config(&cfg, sink, bus.clone());
    tracing::info!(endpoint = %cfg.endpoint, page_size = cfg.page_size, "dashboard starting");

    let mut session = Session::new(mgr.clone(), source, args.json);
    let notes = session.reload().await;
    print_lines(&session.screen().await?);
    print_lines(&notes);
    if args.once {
        return Ok(());
    }

    let notices = spawn_notices(&bus);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        let cmd = match command::parse(&line) {
            Ok(Some(cmd)) => cmd,
            Ok(None) => continue,
            Err(err) => {
                println!("{err}");
                continue;
            }
        };
        let (out, flow) = session.handle(cmd).await?;
        print_lines(&out);
        if flow == Flow::Quit {
            break;
        }
    }
    mgr.shutdown();
    notices.abort();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn session() -> Session {
        let sink = Arc::new(SimulatedRoundTrip::new(Duration::ZERO));
        let mgr = FeedbackManager::new(2, Duration::from_millis(20), sink, Bus::new(16));
        Session::new(mgr, Box::new(SeedSource::new(seed_records())), false)
    }

    async fn run(s: &mut Session, line: &str) -> Vec<String> {
        let cmd = command::parse(line).expect("parse").expect("command");
        s.handle(cmd).await.expect("handle").0
    }

    #[tokio::test]
    async fn paging_and_filters_drive_the_view() {
        let mut s = session();
        assert!(s.reload().await.is_empty());
        let out = run(&mut s, "next").await;
        assert_eq!(out.last().map(String::as_str), Some("Page 2 of 3 (5 matching)"));
        let out = run(&mut s, "status new").await;
        assert_eq!(out.last().map(String::as_str), Some("Page 1 of 1 (2 matching)"));
        let out = run(&mut s, "search nothing-matches-this").await;
        assert!(out.contains(&"No feedback items found.".to_string()));
    }

    #[tokio::test]
    async fn edit_save_updates_record_and_clears_draft() {
        let mut s = session();
        s.reload().await;
        run(&mut s, "edit 2").await;
        assert!(s.draft.is_some());
        run(&mut s, "message Contrast fixed in the new theme").await;
        let out = run(&mut s, "save").await;
        assert!(s.draft.is_none(), "{out:?}");
        let snap = s.mgr.snapshot().await;
        assert_eq!(
            snap.get("2").and_then(|r| r.feedback_message.as_deref()),
            Some("Contrast fixed in the new theme")
        );
        assert_eq!(snap.editing_id(), None);
    }

    #[tokio::test]
    async fn invalid_save_keeps_draft_open() {
        let mut s = session();
        s.reload().await;
        run(&mut s, "edit 2").await;
        let out = run(&mut s, "save").await;
        assert!(out.iter().any(|l| l.starts_with("save: validation failed")));
        assert!(s.draft.is_some());
        assert_eq!(s.mgr.snapshot().await.editing_id(), Some("2"));
    }

    #[tokio::test]
    async fn opening_another_row_drops_the_draft() {
        let mut s = session();
        s.reload().await;
        run(&mut s, "edit 1").await;
        run(&mut s, "open 2").await;
        assert!(s.draft.is_none());
    }

    #[tokio::test]
    async fn draft_commands_need_an_edit() {
        let mut s = session();
        s.reload().await;
        let out = run(&mut s, "message hello").await;
        assert!(out.iter().any(|l| l.contains("nothing is being edited")));
    }

    #[tokio::test]
    async fn rejected_attachment_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"plain").expect("write");
        let mut s = session();
        s.reload().await;
        run(&mut s, "edit 3").await;
        let out = run(&mut s, &format!("attach {}", path.display())).await;
        assert!(out.iter().any(|l| l.starts_with("attach:")), "{out:?}");
        assert_eq!(s.draft.as_ref().and_then(|d| d.pending_file.as_ref()), None);
    }

    #[tokio::test]
    async fn download_writes_decoded_attachment() {
        let dir = tempfile::tempdir().expect("tempdir");
        let xlsx = dir.path().join("report.xlsx");
        std::fs::write(&xlsx, b"xlsx").expect("write");
        let out_path = dir.path().join("out.xlsx");
        let mut s = session();
        s.reload().await;
        run(&mut s, "edit 3").await;
        run(&mut s, &format!("attach {}", xlsx.display())).await;
        run(&mut s, "save").await;
        let out = run(&mut s, &format!("download 3 {}", out_path.display())).await;
        assert!(out.iter().any(|l| l.starts_with("saved 4 bytes")), "{out:?}");
        assert_eq!(std::fs::read(&out_path).expect("read"), b"xlsx");

        let out = run(&mut s, "download 2").await;
        assert!(out.contains(&"#2 has no attachment".to_string()));
    }

    #[tokio::test]
    async fn failed_download_write_is_a_note() {
        let dir = tempfile::tempdir().expect("tempdir");
        let xlsx = dir.path().join("report.xlsx");
        std::fs::write(&xlsx, b"xlsx").expect("write");
        let mut s = session();
        s.reload().await;
        run(&mut s, "edit 3").await;
        run(&mut s, &format!("attach {}", xlsx.display())).await;
        run(&mut s, "save").await;

        let target = dir.path().join("missing-dir").join("out.xlsx");
        let cmd = command::parse(&format!("download 3 {}", target.display()))
            .expect("parse")
            .expect("command");
        let (out, flow) = s.handle(cmd).await.expect("session keeps running");
        assert_eq!(flow, Flow::Continue);
        assert!(
            out.iter().any(|l| l.starts_with("download: writing ")),
            "{out:?}"
        );
        assert!(out.iter().any(|l| l == "All Feedback (5)"));
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn quit_stops_the_loop() {
        let mut s = session();
        let (_, flow) = s.handle(Command::Quit).await.expect("handle");
        assert_eq!(flow, Flow::Quit);
    }
}
