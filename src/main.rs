use lucena::{EngineConfig, GameOutcome, LearningStore, Position, SearchBudget, SearchEngine};
use std::io::{self, BufRead, Write};
use std::time::Duration;

/// Line-oriented driver: reads FEN strings on stdin and prints the chosen
/// move with its search summary. `result 1-0|0-1|1/2` grades the game for
/// the learning store, `quit` exits.
fn main() {
    env_logger::init();

    let mut config = EngineConfig::default();
    let mut depth = 6;
    let mut time_ms = 5000u64;
    let mut book_path = None;
    let mut learn_path = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--depth" => depth = args.next().and_then(|v| v.parse().ok()).unwrap_or(depth),
            "--time-ms" => time_ms = args.next().and_then(|v| v.parse().ok()).unwrap_or(time_ms),
            "--book" => book_path = args.next(),
            "--learn" => learn_path = args.next(),
            "--no-book" => config.use_opening_book = false,
            "--no-learning" => config.use_learning_bias = false,
            "--no-variety" => config.random_variety = false,
            other => {
                eprintln!("unknown argument: {other}");
                std::process::exit(2);
            }
        }
    }

    let mut engine = SearchEngine::new(config);
    if let Some(path) = book_path {
        if let Err(err) = engine.load_book(&path) {
            log::warn!("running without a book: {err}");
        }
    }
    if let Some(path) = learn_path {
        engine.attach_learning(LearningStore::open(path));
    }

    let budget = SearchBudget::new(depth, Duration::from_millis(time_ms));
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(_) => break,
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" {
            break;
        }
        if let Some(result) = line.strip_prefix("result ") {
            let outcome = match result.trim() {
                "1-0" => GameOutcome::WhiteWin,
                "0-1" => GameOutcome::BlackWin,
                _ => GameOutcome::Draw,
            };
            if let Err(err) = engine.finalize_game(outcome) {
                eprintln!("error: could not persist learning data: {err}");
            }
            continue;
        }

        let pos = match Position::from_fen(line) {
            Ok(pos) => pos,
            Err(err) => {
                eprintln!("error: {err}");
                continue;
            }
        };

        match engine.choose_move(&pos, budget) {
            Ok(report) => {
                let _ = writeln!(
                    stdout,
                    "{} ({})",
                    report.best_move.to_uci(),
                    report.explanation()
                );
                let _ = stdout.flush();
            }
            Err(err) => eprintln!("error: {err}"),
        }
    }
}
