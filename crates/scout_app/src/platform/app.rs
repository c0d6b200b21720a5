use std::io::BufRead;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;

use scout_core::{update, AppState, Msg};
use scout_engine::{epoch_ms, EngineConfig, FileStore, SessionStore};
use scout_logging::{scout_error, scout_info};

use super::console::{self, Command};
use super::effects::EffectRunner;
use super::logging;

/// Everything the dispatch loop consumes, serialized through one channel so
/// core updates run one at a time.
#[derive(Debug)]
pub enum AppMsg {
    Core(Msg),
    Show,
    Quit,
}

pub fn run_app() {
    let state_dir = state_dir();
    if let Err(err) = scout_engine::ensure_state_dir(&state_dir) {
        eprintln!("warning: state directory unusable: {err}");
    }
    logging::initialize(Some(&state_dir.join("scout.log")));

    let store: Box<dyn SessionStore> = Box::new(FileStore::new(state_dir.clone()));
    let (msg_tx, msg_rx) = mpsc::channel::<AppMsg>();

    let runner = match EffectRunner::new(EngineConfig::default(), store, state_dir, msg_tx.clone())
    {
        Ok(runner) => runner,
        Err(err) => {
            scout_error!("engine start failed: {}", err);
            eprintln!("engine start failed: {err}");
            return;
        }
    };
    runner.load_startup(&msg_tx);
    spawn_stdin_reader(msg_tx);

    let mut state = AppState::new();
    println!("groupscout ready. type 'help' for commands.");

    while let Ok(msg) = msg_rx.recv() {
        match msg {
            AppMsg::Quit => break,
            AppMsg::Show => console::render_full(&state.view()),
            AppMsg::Core(msg) => {
                let (next, effects) = update(std::mem::take(&mut state), msg);
                state = next;
                scout_logging::set_session_seq(state.session_seq());
                runner.run(effects, &state);
                if state.consume_dirty() {
                    console::render(&state.view());
                }
            }
        }
    }
    scout_info!("shutting down");
}

fn state_dir() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".groupscout")
}

fn spawn_stdin_reader(msg_tx: mpsc::Sender<AppMsg>) {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            match console::parse(&line, epoch_ms()) {
                Command::Msgs(msgs) => {
                    for msg in msgs {
                        if msg_tx.send(AppMsg::Core(msg)).is_err() {
                            return;
                        }
                    }
                }
                Command::Show => {
                    if msg_tx.send(AppMsg::Show).is_err() {
                        return;
                    }
                }
                Command::Help => println!("{}", console::HELP),
                Command::Quit => {
                    let _ = msg_tx.send(AppMsg::Quit);
                    return;
                }
                Command::Unknown(line) => {
                    println!("unknown command: {line:?} (type 'help')");
                }
            }
        }
        let _ = msg_tx.send(AppMsg::Quit);
    });
}
