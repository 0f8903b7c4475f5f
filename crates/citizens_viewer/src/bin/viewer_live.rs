//! Headless live viewer: connects to a running simulation server,
//! mirrors its state, and prints the activity log to stdout. Control
//! subcommands hit the operator endpoints and exit.

use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use citizens_viewer::ops::ControlClient;
use citizens_viewer::{ViewerApp, ViewerConfig};

fn print_usage() {
    eprintln!("usage: viewer_live [--api-base URL] [COMMAND]");
    eprintln!();
    eprintln!("Without a command, follows the live activity log until Ctrl-C.");
    eprintln!();
    eprintln!("commands:");
    eprintln!("  tick                advance the simulation one tick");
    eprintln!("  speed FACTOR        set the tick speed multiplier");
    eprintln!("  reset-day           roll forward to the next day");
    eprintln!("  seed                re-seed the world");
    eprintln!("  event DESCRIPTION   inject a user-submitted world event");
}

fn main() {
    let mut config = ViewerConfig::from_env();
    let mut command: Vec<String> = Vec::new();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--api-base" => {
                let Some(value) = args.next() else {
                    eprintln!("--api-base requires a value");
                    process::exit(2);
                };
                config = config.with_api_base(value.trim_end_matches('/'));
            }
            "--help" | "-h" => {
                print_usage();
                return;
            }
            _ if arg.starts_with('-') => {
                eprintln!("unknown flag: {arg}");
                print_usage();
                process::exit(2);
            }
            _ => {
                command.push(arg);
                command.extend(args.by_ref());
            }
        }
    }

    if !command.is_empty() {
        run_command(&config, &command);
        return;
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = Arc::clone(&shutdown);
        if let Err(err) = ctrlc::set_handler(move || shutdown.store(true, Ordering::SeqCst)) {
            eprintln!("failed to install signal handler: {err}");
            process::exit(1);
        }
    }

    let frame_interval = config.frame_interval;
    let mut app = match ViewerApp::new(config) {
        Ok(app) => app,
        Err(err) => {
            eprintln!("startup failed: {err}");
            process::exit(1);
        }
    };

    let mut printed_seq = 0u64;
    while !shutdown.load(Ordering::SeqCst) {
        app.tick();
        let seq = app.store().log_seq();
        if seq > printed_seq {
            let fresh = (seq - printed_seq) as usize;
            // The log is newest-first; print the new lines oldest-first.
            let mut lines: Vec<&str> = app.store().log().take(fresh).collect();
            lines.reverse();
            for line in lines {
                println!("{line}");
            }
            printed_seq = seq;
        }
        thread::sleep(frame_interval);
    }
}

fn run_command(config: &ViewerConfig, command: &[String]) {
    let client = match ControlClient::new(&config.api_base) {
        Ok(client) => client,
        Err(err) => {
            eprintln!("client setup failed: {err}");
            process::exit(1);
        }
    };
    let result = match command[0].as_str() {
        "tick" => client.trigger_tick(),
        "speed" => {
            let Some(factor) = command.get(1).and_then(|raw| raw.parse().ok()) else {
                eprintln!("speed requires a numeric FACTOR");
                process::exit(2);
            };
            client.set_speed(factor)
        }
        "reset-day" => client.reset_day(),
        "seed" => client.reseed(),
        "event" => {
            let description = command[1..].join(" ");
            if description.is_empty() {
                eprintln!("event requires a DESCRIPTION");
                process::exit(2);
            }
            client.trigger_user_event(&description)
        }
        other => {
            eprintln!("unknown command: {other}");
            print_usage();
            process::exit(2);
        }
    };
    if let Err(err) = result {
        eprintln!("request failed: {err}");
        process::exit(1);
    }
}
