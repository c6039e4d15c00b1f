use clap::Parser;
use color_eyre::eyre::{Result, eyre};
use futures::future::join_all;
use log::{debug, info};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use ggnav::config::{Args, Config};
use ggnav::graph::sha_from_element_id;
use ggnav::layout::{Layout, PreferenceStore};
use ggnav::logging;
use ggnav::transport::HttpTransport;
use ggnav::tree::ROOT;
use ggnav::{CommitResolver, LoadOutcome, Notice, Session, TreeNavigator};

include!(concat!(env!("OUT_DIR"), "/git_sha.rs"));

const HELP: &str = "commands:
  find <sha>                 locate a commit and show it
  click <element id>         load a commit (node id or label_<sha>)
  reveal                     load the next page of the graph
  expand [path]              list a tree directory (root when omitted)
  select <path>              show a file in the detail pane
  hover <id,id,..> <colour>  highlight related nodes
  unhover <id,id,..>         restore related nodes
  split top|left <fraction>  move a pane divider
  toggle top|bottom          expand or restore a pane
  status                     show navigation state
  quit";

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.version {
        println!("ggnav version {} (git: {GIT_SHA})", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = Config::load()?;
    let final_config = config.merge_with_args(&args);

    logging::init_logging(final_config.debug.unwrap_or(false))?;
    color_eyre::install()?;

    let server_url = final_config.get_server_url();
    info!("Starting ggnav against {server_url}");
    let transport = Arc::new(HttpTransport::new(&server_url).map_err(|e| eyre!("{e}"))?);

    let (session, notices) = Session::new(final_config.get_session_config());
    let resolver = CommitResolver::new(session.clone(), transport.clone());
    let navigator = TreeNavigator::new(session.clone(), transport);

    let mut prefs = PreferenceStore::open(final_config.get_prefs_path())?;
    let mut layout = Layout::restore(&prefs);

    let printer = tokio::spawn(print_notices(notices));

    open_initial_view(&resolver, &navigator).await;
    println!("{HELP}");

    let mut tasks: Vec<JoinHandle<()>> = Vec::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            continue;
        };
        let rest: Vec<String> = words.map(str::to_string).collect();
        debug!("Command {command} {rest:?}");

        match command {
            "quit" | "exit" => break,
            "help" => println!("{HELP}"),
            "find" => {
                let resolver = resolver.clone();
                let navigator = navigator.clone();
                let input = rest.first().cloned().unwrap_or_default();
                tasks.push(tokio::spawn(async move {
                    let Ok(hit) = resolver.search(&input).await else {
                        return;
                    };
                    println!("found at row {}", hit.resolution.row());
                    if hit.is_loaded() {
                        let _ = navigator.load_commit_tree(&hit.sha).await;
                    } else {
                        println!("busy, detail not loaded");
                    }
                }));
            }
            "click" => {
                let resolver = resolver.clone();
                let navigator = navigator.clone();
                let id = rest.first().cloned().unwrap_or_default();
                tasks.push(tokio::spawn(async move {
                    match resolver.click(&id).await {
                        Ok(LoadOutcome::Loaded(status)) => {
                            println!("loaded ({status:?})");
                            if let Some(sha) = sha_from_element_id(&id) {
                                let _ = navigator.load_commit_tree(&sha).await;
                            }
                        }
                        Ok(LoadOutcome::Dropped) => println!("busy, click ignored"),
                        Err(e) => debug!("click {id}: {e}"),
                    }
                }));
            }
            "reveal" => {
                let resolver = resolver.clone();
                tasks.push(tokio::spawn(async move {
                    if let Ok(added) = resolver.reveal().await {
                        println!("{added} more commits");
                    }
                }));
            }
            "expand" => {
                let navigator = navigator.clone();
                let path = rest.join(" ");
                tasks.push(tokio::spawn(async move {
                    match navigator.expand(&path).await {
                        Ok(children) => {
                            for child in children {
                                let marker = if child.is_dir() { "/" } else { "" };
                                println!("  {}{marker}", child.full_name);
                            }
                        }
                        Err(e) => println!("{}", e.user_message()),
                    }
                }));
            }
            "select" => {
                let navigator = navigator.clone();
                let session = session.clone();
                let path = rest.join(" ");
                tasks.push(tokio::spawn(async move {
                    match navigator.select(&path).await {
                        Ok(outcome) => {
                            let detail = session.detail().await;
                            println!(
                                "{outcome:?}: {}{}",
                                detail.title().unwrap_or_default(),
                                if detail.has_jump_link() {
                                    " (Go to first change)"
                                } else {
                                    ""
                                }
                            );
                        }
                        Err(e) => println!("{}", e.user_message()),
                    }
                }));
            }
            "hover" | "unhover" => {
                let ids: Vec<String> = rest
                    .first()
                    .map(|list| list.split(',').map(str::to_string).collect())
                    .unwrap_or_default();
                if command == "hover" {
                    let colour = rest.get(1).map(String::as_str).unwrap_or("red");
                    resolver.highlight_related(&ids, colour).await;
                } else {
                    resolver.unhighlight_related(&ids).await;
                }
            }
            "split" => {
                let fraction = rest.get(1).and_then(|v| v.parse::<f64>().ok());
                let split = match (rest.first().map(String::as_str), fraction) {
                    (Some("top"), Some(f)) => Some(layout.set_top_fraction(&mut prefs, f)?),
                    (Some("left"), Some(f)) => Some(layout.set_left_fraction(&mut prefs, f)?),
                    _ => None,
                };
                match split {
                    Some(split) => println!("{:.1}% / {:.1}%", split.first, split.second),
                    None => println!("usage: split top|left <fraction>"),
                }
            }
            "toggle" => {
                let split = match rest.first().map(String::as_str) {
                    Some("top") => layout.toggle_top_expansion(),
                    Some("bottom") => layout.toggle_bottom_expansion(),
                    _ => {
                        println!("usage: toggle top|bottom");
                        continue;
                    }
                };
                println!("{:.1}% / {:.1}%", split.first, split.second);
            }
            "status" => print_status(&session).await,
            other => println!("unknown command {other:?}, try help"),
        }

        tasks.retain(|task| !task.is_finished());
    }

    join_all(tasks).await;
    drop(resolver);
    drop(navigator);
    drop(session);
    let _ = printer.await;
    info!("ggnav exiting");
    Ok(())
}

/// Load the first page of the graph and show its head commit
async fn open_initial_view(
    resolver: &CommitResolver<HttpTransport>,
    navigator: &TreeNavigator<HttpTransport>,
) {
    let Ok(added) = resolver.reveal().await else {
        return;
    };
    println!("graph loaded with {added} commits");

    let head = {
        let graph = resolver.session().graph().await;
        graph.first_node()
    };
    if let Some(head) = head {
        let _ = resolver.resolve(&head).await;
        let _ = resolver.load_commit(&head).await;
        if navigator.load_commit_tree(&head).await.is_ok()
            && let Ok(children) = navigator.expand(ROOT).await
        {
            for child in children {
                println!("  {}", child.full_name);
            }
        }
    }
}

async fn print_status(session: &Arc<Session>) {
    let (offset, epoch, head) = {
        let graph = session.graph().await;
        (graph.offset(), graph.epoch(), graph.head().path())
    };
    let active = session
        .highlight()
        .await
        .active()
        .map(|sha| sha.short().to_string())
        .unwrap_or_else(|| "-".to_string());
    let title = session
        .detail()
        .await
        .title()
        .map(str::to_string)
        .unwrap_or_else(|| "-".to_string());
    println!(
        "head {head} | epoch {epoch} | offset {offset} | active {active} | detail {title} | gate {} | loader {}",
        if session.gate().is_busy() { "busy" } else { "idle" },
        if session.loader().is_visible() { "shown" } else { "hidden" },
    );
}

async fn print_notices(mut notices: mpsc::UnboundedReceiver<Notice>) {
    while let Some(notice) = notices.recv().await {
        match notice {
            Notice::Alert(message) => println!("[!] {message}"),
            Notice::Status(message) => println!("{message}"),
        }
    }
}
