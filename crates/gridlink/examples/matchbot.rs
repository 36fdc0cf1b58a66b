//! A headless player that queues for a match and plays it out by taking
//! the first free cell every turn.
//!
//! Run two of these against a local server to watch a full game:
//!
//! ```text
//! cargo run --example matchbot -- alice
//! cargo run --example matchbot -- bob
//! ```
//!
//! `GRIDLINK_HTTP_URL` and `GRIDLINK_SOCKET_URL` point the bot at a
//! non-default server; `RUST_LOG` controls log output as usual.

use gridlink::prelude::*;
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// Event plumbing
// ---------------------------------------------------------------------------

// Callbacks fire on the reader task; the bot logic lives in main. An
// unbounded channel carries events across without blocking the reader.
enum BotEvent {
    Found(MatchId),
    Data(MatchDataEvent),
    Presence(MatchPresenceEvent),
}

fn wire_callbacks(client: &DefaultClient, tx: mpsc::UnboundedSender<BotEvent>) {
    let found = tx.clone();
    client.on_match_found(move |match_id| {
        let _ = found.send(BotEvent::Found(match_id));
    });

    let data = tx.clone();
    client.on_match_data(move |event| {
        let _ = data.send(BotEvent::Data(event));
    });

    client.on_match_presence(move |event| {
        let _ = tx.send(BotEvent::Presence(event));
    });
}

// ---------------------------------------------------------------------------
// Board helpers
// ---------------------------------------------------------------------------

fn render(board: &Board) -> String {
    let cell = |i: usize| board[i].map_or(".".to_string(), |m| m.to_string());
    (0..3)
        .map(|r| format!("{} {} {}", cell(3 * r), cell(3 * r + 1), cell(3 * r + 2)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn first_free(board: &Board) -> Option<u8> {
    board.iter().position(|c| c.is_none()).map(|i| i as u8)
}

// ---------------------------------------------------------------------------
// Bot
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("gridlink=info")),
        )
        .init();

    let username = std::env::args().nth(1).unwrap_or_else(|| "guest".into());

    let mut builder = GridlinkClient::builder();
    if let Ok(url) = std::env::var("GRIDLINK_HTTP_URL") {
        builder = builder.base_url(url);
    }
    if let Ok(url) = std::env::var("GRIDLINK_SOCKET_URL") {
        builder = builder.socket_url(url);
    }
    let client = builder.build()?;

    let session = client.authenticate(&username).await?;
    println!("signed in as {} ({})", session.username, session.user_id);
    let my_id = session.user_id;

    client.connect().await?;

    let (tx, mut events) = mpsc::unbounded_channel();
    wire_callbacks(&client, tx);

    let ticket = client.find_match().await?;
    println!("queued as {ticket}, waiting for an opponent...");

    // Our index into the game-start player list; `current_turn` uses the
    // same indexing, so comparing the two answers "is it our move?".
    let mut my_seat = None;

    while let Some(event) = events.recv().await {
        match event {
            BotEvent::Found(match_id) => {
                let info = client.join_match(&match_id).await?;
                println!("joined {}", info.match_id);
            }

            BotEvent::Presence(presence) => {
                for p in &presence.joins {
                    println!("{} is here", p.username);
                }
                for p in &presence.leaves {
                    println!("{} left", p.username);
                }
            }

            BotEvent::Data(event) => match event.message {
                MatchMessage::Update(UpdatePayload::GameStart { players, current_turn }) => {
                    my_seat = players.iter().position(|p| p.user_id == my_id);
                    for p in &players {
                        println!("{} plays {}", p.username, p.symbol);
                    }
                    if my_seat == Some(current_turn) {
                        client.send_move(0).await?; // empty board: top-left
                    }
                }

                MatchMessage::Update(UpdatePayload::BoardUpdate { board, current_turn }) => {
                    println!("{}\n", render(&board));
                    if my_seat == Some(current_turn) {
                        if let Some(position) = first_free(&board) {
                            client.send_move(position).await?;
                        }
                    }
                }

                MatchMessage::GameOver(outcome) => {
                    println!("{}\n", render(&outcome.board));
                    match outcome.winner.as_deref() {
                        Some(winner) if winner == my_id => println!("won: {}", outcome.reason),
                        Some(_) => println!("lost: {}", outcome.reason),
                        None => println!("draw: {}", outcome.reason),
                    }
                    break;
                }

                MatchMessage::OpponentLeft => {
                    println!("opponent left, match abandoned");
                    break;
                }

                // Raw moves are never relayed to clients; state arrives as
                // board updates instead.
                MatchMessage::Move(_) => {}
            },
        }
    }

    let stats = client.refresh_stats_after_game().await?;
    println!(
        "record: {} wins, {} losses, {} draws over {} games",
        stats.wins, stats.losses, stats.draws, stats.total_games
    );

    println!("top of the leaderboard:");
    for entry in client.leaderboard(5).await? {
        let rank = entry.rank.map_or("-".into(), |r| r.to_string());
        println!(
            "  {:>3}  {:<16} {} wins ({:.1}%)",
            rank, entry.username, entry.wins, entry.win_rate
        );
    }

    client.logout().await;
    Ok(())
}
