//! `tinsel`: drive a shared ornament tree session from the terminal.
//!
//! Runs one `App` against the in-memory store, auth, and host, and reads
//! commands from stdin, one per line. Notices are printed as they arrive.
//!
//! ```text
//! tinsel [--path /tree/<id>]
//! ```

mod command;

use command::{Command, HELP, parse_command};
use std::sync::Arc;
use tinsel_core::id::UserId;
use tinsel_core::model::{DragPayload, Identity};
use tinsel_core::{DropZone, Point};
use tinsel_editor::{
    App, ConfirmOutcome, DeleteOutcome, DropOutcome, Host, MemoryHost, SessionConfig,
};
use tinsel_store::{MemoryAuth, MemoryStore};
use tokio::io::{AsyncBufReadExt, BufReader};

const USAGE: &str = "usage: tinsel [--path /tree/<id>]";

/// Location path from the command line, `/` when absent.
fn parse_args(args: &[String]) -> Result<String, String> {
    let mut path = "/".to_string();
    let mut args = args.iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--path" => {
                path = args
                    .next()
                    .cloned()
                    .ok_or_else(|| "--path needs a value".to_string())?;
            }
            other => match other.strip_prefix("--path=") {
                Some(value) => path = value.to_string(),
                None => return Err(format!("unknown argument '{other}'")),
            },
        }
    }
    Ok(path)
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("{USAGE}\n\n{HELP}");
        return;
    }
    let path = match parse_args(&args) {
        Ok(path) => path,
        Err(e) => {
            eprintln!("tinsel: {e}");
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
    };

    let store = Arc::new(MemoryStore::new());
    let auth = Arc::new(MemoryAuth::new());
    let host = Arc::new(MemoryHost::at(&path));
    let (app, mut notices) = App::new(
        SessionConfig::from_env(),
        store,
        auth.clone(),
        host.clone(),
    );

    tokio::spawn(async move {
        while let Some(notice) = notices.recv().await {
            println!("! {notice}");
        }
    });

    match app.mount().await {
        Ok(tree) => println!("tree {} at {}", tree.id, host.path()),
        Err(e) => {
            eprintln!("tinsel: could not open a tree: {e}");
            std::process::exit(1);
        }
    }

    let mut session = Session {
        app,
        auth,
        drag: None,
    };
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                log::error!("reading stdin failed: {e}");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match parse_command(&line) {
            Ok(Command::Quit) => break,
            Ok(cmd) => session.run(cmd).await,
            Err(msg) => eprintln!("{msg}"),
        }
    }
}

// ─── Command dispatch ────────────────────────────────────────────────────

struct Session {
    app: App,
    auth: Arc<MemoryAuth>,
    /// The gesture in progress between `drag` and `drop`.
    drag: Option<DragPayload>,
}

impl Session {
    async fn run(&mut self, cmd: Command) {
        let app = &self.app;
        match cmd {
            Command::SignIn { uid, name } => {
                self.auth.script_sign_in(Ok(Identity {
                    id: UserId::intern(&uid),
                    display_name: name,
                }));
                if let Ok(who) = app.sign_in().await {
                    println!("signed in as {}", who.id);
                }
            }
            Command::SignOut => {
                if app.sign_out().await.is_ok() {
                    println!("signed out");
                }
            }
            Command::Drag { kind, existing } => {
                self.drag = Some(app.start_drag(kind, existing));
                println!("dragging {kind}");
            }
            Command::Drop { x, y } => {
                let Some(payload) = self.drag.take() else {
                    eprintln!("nothing is being dragged");
                    return;
                };
                match app.on_drop(payload, Point::new(x, y)).await {
                    DropOutcome::Staged(pending) => println!(
                        "staged {} at ({:.1}, {:.1}); set a sender, then confirm",
                        pending.kind, pending.position.x, pending.position.y
                    ),
                    DropOutcome::Moved(id) => println!("moved {id}"),
                    DropOutcome::MoveFailed(id) => println!("could not move {id}"),
                    DropOutcome::Ignored(reason) => println!("drop ignored: {reason:?}"),
                }
            }
            Command::Zone {
                left,
                top,
                width,
                height,
            } => app.set_drop_zone(DropZone::new(left, top, width, height)),
            Command::Sender(text) => app.set_sender(&text),
            Command::Message(text) => app.set_message(&text),
            Command::Confirm => match app.confirm_drop().await {
                Ok(ConfirmOutcome::Saved(id)) => println!("saved {id}"),
                Ok(ConfirmOutcome::Skipped(why)) => println!("nothing saved: {why:?}"),
                Err(_) => {}
            },
            Command::Cancel => app.cancel_drop(),
            Command::Open(id) => {
                if !app.open_message_by_id(id) {
                    eprintln!("no ornament {id} on this tree");
                    return;
                }
                if let Some(ornament) = app.state().selected() {
                    println!("from {}: {}", ornament.sender, ornament.message);
                    if app.can_delete() {
                        println!("(you can delete this ornament)");
                    }
                }
            }
            Command::Close => app.close_message(),
            Command::Delete => match app.delete_ornament().await {
                Ok(DeleteOutcome::Deleted(id)) => println!("deleted {id}"),
                Ok(DeleteOutcome::NothingSelected) => eprintln!("open an ornament first"),
                Ok(DeleteOutcome::Declined) => println!("kept"),
                Err(_) => {}
            },
            Command::Link => {
                if let Ok(link) = app.copy_link().await {
                    println!("{link}");
                }
            }
            Command::List => self.list(),
            Command::Help => println!("{HELP}"),
            Command::Quit => {}
        }
    }

    fn list(&self) {
        let state = self.app.state();
        if let Some(tree) = state.tree() {
            let owner = tree.owner_name.or(tree.owner_id.map(|id| id.to_string()));
            match owner {
                Some(owner) => println!("tree {} (owner {owner})", tree.id),
                None => println!("tree {} (no owner)", tree.id),
            }
        }
        for ornament in state.ornaments() {
            println!(
                "  {:<34} {:<14} ({:5.1}, {:5.1})  {}{}",
                ornament.id,
                ornament.kind,
                ornament.position.x,
                ornament.position.y,
                ornament.sender,
                if ornament.is_pending() { " (saving)" } else { "" },
            );
        }
    }
}
