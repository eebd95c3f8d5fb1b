//! Terminal output for the client.

use std::io::Write;

use kairo_shared::time::timestamp_to_local_hms;
use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::mpsc;

/// Format a message received from the room
pub fn format_incoming(text: &str, received_at_millis: i64) -> String {
    format!("\r[{}] {}\n", timestamp_to_local_hms(received_at_millis), text)
}

/// Redisplay the prompt after receiving a message
pub fn redisplay_prompt(name: &str) {
    print!("{}> ", name);
    std::io::stdout().flush().ok();
}

/// Read input lines on a dedicated thread for the lifetime of the client.
///
/// The channel closes when the user ends the input (Ctrl+C or Ctrl+D).
pub fn spawn_input_reader(name: &str) -> mpsc::UnboundedReceiver<String> {
    let (input_tx, input_rx) = mpsc::unbounded_channel();
    let prompt = format!("{}> ", name);

    // rustyline blocks, so it gets a thread of its own
    std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                    tracing::info!("Input closed");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    input_rx
}
