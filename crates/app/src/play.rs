//! Line-oriented stand-in for the map screen.
//!
//! Each line is one gesture: a `lat,lon` pair taps the map, `check` submits,
//! `m` toggles the music and `q` goes back to the level list.

use std::sync::Arc;

use geoquest_core::model::{Coordinate, GameLaunch, Question, parse_leading_float};
use services::audio::GAME_TRACK;
use services::{
    Advance, AlertAction, GameError, GameLoopService, GameSession, ResultsView, SilentBackend,
    SoundtrackController,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

#[derive(Debug, Clone, PartialEq)]
enum Gesture {
    Tap(Coordinate),
    Check,
    ToggleMute,
    Back,
    Unknown(String),
}

fn parse_gesture(line: &str) -> Option<Gesture> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let gesture = match line {
        "c" | "check" => Gesture::Check,
        "m" | "mute" => Gesture::ToggleMute,
        "q" | "quit" | "back" => Gesture::Back,
        _ => parse_tap(line).map_or_else(|| Gesture::Unknown(line.to_owned()), Gesture::Tap),
    };
    Some(gesture)
}

fn parse_tap(line: &str) -> Option<Coordinate> {
    let (lat, lon) = line.split_once(',')?;
    let lat = parse_leading_float(lat)?;
    let lon = parse_leading_float(lon)?;
    Coordinate::new(lat, lon).ok()
}

fn show_question(index: usize, total: usize, question: &Question) {
    println!();
    println!("[{}/{}] {}", index + 1, total, question.title());
    if !question.text().is_empty() {
        println!("{}", question.text());
    }
    println!("Tap the map with `lat,lon`, then `check`.");
}

fn show_alert(err: &GameError) -> AlertAction {
    let alert = err.alert();
    if alert.message.is_empty() {
        println!("! {}", alert.title);
    } else {
        println!("! {}: {}", alert.title, alert.message);
    }
    alert.action
}

/// Runs one level from the given input until results or the player goes back.
///
/// # Errors
///
/// Returns an error only for I/O failures on the input stream.
pub async fn play<R>(
    service: &GameLoopService,
    launch: GameLaunch,
    input: R,
) -> Result<Option<ResultsView>, std::io::Error>
where
    R: AsyncBufRead + Unpin,
{
    let mut music = SoundtrackController::new(Arc::new(SilentBackend::new()), launch.muted);
    music.load(GAME_TRACK).await;

    println!("Level {}  {}", launch.level, launch.difficulty.stars());
    println!("Loading questions...");
    let outcome = match service.start(launch).await {
        Ok(session) => run_session(service, session, &mut music, input).await,
        Err(err) => {
            show_alert(&err);
            Ok(None)
        }
    };

    music.unload().await;
    outcome
}

async fn run_session<R>(
    service: &GameLoopService,
    mut session: GameSession,
    music: &mut SoundtrackController,
    input: R,
) -> Result<Option<ResultsView>, std::io::Error>
where
    R: AsyncBufRead + Unpin,
{
    let total = session.progress().total;
    if let Some(question) = session.current_question() {
        show_question(0, total, question);
    }

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let Some(gesture) = parse_gesture(&line) else {
            continue;
        };
        match gesture {
            Gesture::Tap(at) => match service.place_marker(&mut session, at) {
                Ok(()) => println!("Marker at {at}"),
                Err(err) => {
                    show_alert(&err);
                }
            },
            Gesture::Check => {
                let outcome = match service.check(&mut session) {
                    Ok(outcome) => outcome,
                    Err(err) => {
                        if show_alert(&err) == AlertAction::GoBack {
                            return Ok(None);
                        }
                        continue;
                    }
                };
                println!(
                    "You are {} km from the target ({}). +{} pts",
                    outcome.attempt.distance, outcome.attempt.target, outcome.attempt.score
                );
                tokio::time::sleep(service.config().reveal_delay).await;

                match service.advance(&mut session).await {
                    Ok(Advance::Next { index, question }) => show_question(index, total, &question),
                    Ok(Advance::Finished { .. }) => {
                        let view = ResultsView::from_session(&session);
                        println!();
                        println!("{view}");
                        return Ok(Some(view));
                    }
                    Err(err) => {
                        // The run is over even if saving failed; show what we have.
                        show_alert(&err);
                        if session.is_complete() {
                            let view = ResultsView::from_session(&session);
                            println!("{view}");
                            return Ok(Some(view));
                        }
                    }
                }
            }
            Gesture::ToggleMute => {
                let muted = music.toggle_mute().await;
                println!("{}", if muted { "Music off" } else { "Music on" });
            }
            Gesture::Back => return Ok(None),
            Gesture::Unknown(raw) => println!("? {raw}"),
        }
    }

    Ok(None)
}
