//! # CLI - refdata inspection shell
//!
//! A REPL for encoding, decoding and patching reference data records by hand.
//! Reads commands from stdin and prints one result line per command to
//! stdout, so it works both interactively and with piped scripts. Records are
//! written and read as hex.
//!
//! ## Commands
//!
//! ```text
//! ENCODE POINT <uid> <key>                       point key
//! ENCODE RANGE <uid> <from> <to>                 range key for [from, to)
//! ENCODE DEDUP <text>                            first dedup key for a value
//! ENCODE META <type_id> <ref_count>              value metadata
//! ENCODE STREAM <pipeline> <version> <stream> <part>
//! ENCODE MAP <pipeline> <version> <stream> <part> [name]
//! ENCODE INFO <create> <access> <effective> <state>
//! ENCODE STAGING <text>                          staged string value
//! DECODE <POINT|RANGE|DEDUP|META|STREAM|MAP|INFO|STAGING> <hex>
//! LOCATE <range-hex> <uid> <probe>               below / within / above / uid-mismatch
//! REFCOUNT <INC|DEC> <meta-hex>                  copy with adjusted count
//! TOUCH <info-hex> <timestamp>                   set last-accessed time
//! STATE <info-hex> <state>                       set processing state
//! EXIT / QUIT
//! ```
//!
//! Failures print `ERR <reason>` and the shell carries on.
//!
//! ## Configuration
//!
//! ```text
//! REFDATA_BUFFER_CAPACITY      buffer size for encoded records (default: 4096)
//! REFDATA_POOL_MAX_PER_BUCKET  idle buffers kept per size      (default: 16)
//! REFDATA_LOG                  tracing filter, logs to stderr  (default: "warn")
//! ```
//!
//! ## Example
//!
//! ```text
//! $ cargo run -p cli
//! refdata shell (buffer=4096B, pool=16/bucket)
//! > ENCODE RANGE 7 10 20
//! 00000007800000000000000a8000000000000014
//! > LOCATE 00000007800000000000000a8000000000000014 7 15
//! within
//! > EXIT
//! bye
//! ```

mod shell;

use anyhow::Result;
use config::RefDataConfig;
use shell::{Reply, Shell};
use std::io::{self, BufRead, Write};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_logging(config: &RefDataConfig) {
    let filter = EnvFilter::try_new(&config.log_filter)
        .unwrap_or_else(|_| EnvFilter::new(config::DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let config = RefDataConfig::from_env();
    init_logging(&config);
    info!(?config, "starting refdata shell");

    let shell = Shell::new(&config);

    println!(
        "refdata shell (buffer={}B, pool={}/bucket)",
        config.buffer_capacity, config.pool_max_per_bucket
    );
    print!("> ");
    io::stdout().flush().ok();

    let stdin = io::stdin();

    for line in stdin.lock().lines() {
        let line = line?;
        match shell.execute(&line) {
            Ok(Reply::Output(out)) => println!("{}", out),
            Ok(Reply::Empty) => {}
            Ok(Reply::Exit) => {
                println!("bye");
                break;
            }
            Err(e) => println!("ERR {:#}", e),
        }

        print!("> ");
        io::stdout().flush().ok();
    }

    Ok(())
}
