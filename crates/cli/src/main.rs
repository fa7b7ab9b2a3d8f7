//! # CLI - CaskDB Interactive Shell
//!
//! A REPL-style command-line interface for the CaskDB storage engine.
//! Reads commands from stdin, executes them against the store, and prints
//! results to stdout. Designed for both interactive use and scripted testing
//! (pipe commands via stdin).
//!
//! ## Commands
//!
//! ```text
//! SET key value      Insert or update a key-value pair
//! GET key            Look up a key (prints value or "(nil)")
//! DEL key            Delete a key
//! KEYS               List all live keys, sorted
//! SYNC               Flush staged writes to the active segment
//! MERGE              Compact closed segments and rewrite the hint file
//! STATS              Print store debug info
//! EXIT / QUIT        Close the store and shut down
//! ```
//!
//! ## Configuration
//!
//! All settings are controlled via environment variables:
//!
//! ```text
//! CASK_DIR           Database directory            (default: "data/cask")
//! CASK_SYNC_WRITES   Flush on every write          (default: "false")
//! CASK_PENDING_MAX   Pending-buffer soft maximum   (default: 50)
//! CASK_SEGMENT_KB    Rotation threshold in KiB     (default: 10)
//! ```
//!
//! The shell always opens the store with write access; point read-only
//! consumers at the `engine` crate directly.
//!
//! ## Example
//!
//! ```text
//! $ cargo run -p cli
//! CaskDB started (dir=data/cask, keys=0, sync_writes=false)
//! > SET name Alice
//! OK
//! > GET name
//! Alice
//! > KEYS
//! name
//! (1 keys)
//! > EXIT
//! bye
//! ```

use anyhow::Result;
use engine::{Cask, Options};
use std::io::{self, BufRead, Write};

/// Reads a configuration value from the environment, falling back to `default`.
fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn main() -> Result<()> {
    let dir = env_or("CASK_DIR", "data/cask");
    let sync_on_write: bool = env_or("CASK_SYNC_WRITES", "false").parse().unwrap_or(false);
    let pending_max: usize = env_or("CASK_PENDING_MAX", "50").parse().unwrap_or(50);
    let segment_kb: u64 = env_or("CASK_SEGMENT_KB", "10").parse().unwrap_or(10);

    let opts = Options {
        sync_on_write,
        pending_max,
        segment_max_bytes: segment_kb * 1024,
        ..Options::writable()
    };
    let mut db = Cask::open(&dir, opts)?;
    if db.created() {
        println!("created database directory {dir}");
    }

    println!(
        "CaskDB started (dir={}, keys={}, sync_writes={})",
        dir,
        db.key_count(),
        sync_on_write
    );
    println!("Commands: SET key value | GET key | DEL key | KEYS");
    println!("          SYNC | MERGE | STATS | EXIT");
    print!("> ");
    io::stdout().flush().ok();

    let stdin = io::stdin();

    for line in stdin.lock().lines() {
        let line = line?;
        let mut parts = line.split_whitespace();
        if let Some(cmd) = parts.next() {
            match cmd.to_uppercase().as_str() {
                "SET" => {
                    if let Some(k) = parts.next() {
                        let v: String = parts.collect::<Vec<&str>>().join(" ");
                        if v.is_empty() {
                            println!("ERR usage: SET key value");
                        } else {
                            match db.put(k, v.as_bytes()) {
                                Ok(()) => println!("OK"),
                                Err(e) => println!("ERR set failed: {}", e),
                            }
                        }
                    } else {
                        println!("ERR usage: SET key value");
                    }
                }
                "GET" => {
                    if let Some(k) = parts.next() {
                        match db.get(k) {
                            Ok(v) => println!("{}", String::from_utf8_lossy(&v)),
                            Err(engine::Error::KeyNotFound(_)) => println!("(nil)"),
                            Err(e) => println!("ERR read failed: {}", e),
                        }
                    } else {
                        println!("ERR usage: GET key");
                    }
                }
                "DEL" => {
                    if let Some(k) = parts.next() {
                        match db.delete(k) {
                            Ok(()) => println!("OK"),
                            Err(e) => println!("ERR del failed: {}", e),
                        }
                    } else {
                        println!("ERR usage: DEL key");
                    }
                }
                "KEYS" => {
                    let keys = db.list_keys();
                    for key in &keys {
                        println!("{}", key);
                    }
                    println!("({} keys)", keys.len());
                }
                "SYNC" => match db.sync() {
                    Ok(()) => println!("OK (pending={})", db.pending_count()),
                    Err(e) => println!("ERR sync failed: {}", e),
                },
                "MERGE" => match db.merge() {
                    Ok(()) => println!("OK (keys={})", db.key_count()),
                    Err(e) => println!("ERR merge failed: {}", e),
                },
                "STATS" => {
                    println!("{:?}", db);
                }
                "EXIT" | "QUIT" => {
                    break;
                }
                other => {
                    println!("unknown command: {}", other);
                }
            }
        }

        print!("> ");
        io::stdout().flush().ok();
    }

    db.close()?;
    println!("bye");
    Ok(())
}
