use std::env;

use inotify_watch::{
    EventMask,
    Inotify,
    WatchMask,
};
use tracing_subscriber::EnvFilter;


fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut inotify = Inotify::init()
        .expect("Failed to initialize inotify");

    let paths: Vec<_> = env::args_os().skip(1).collect();
    let mut watches = inotify.watches();

    if paths.is_empty() {
        let current_dir = env::current_dir()
            .expect("Failed to determine current directory");
        watches
            .add(current_dir, WatchMask::ALL_EVENTS)
            .expect("Failed to add inotify watch");
    }
    for path in &paths {
        if let Err(error) = watches.add(path, WatchMask::ALL_EVENTS) {
            eprintln!("{}", error);
        }
    }

    // With nothing to watch, the read loop below would block forever.
    if watches.is_empty() {
        std::process::exit(1);
    }

    for entry in watches.entries() {
        println!("Watching {} ({})", entry.path.display(), entry.wd.get_watch_descriptor_id());
    }

    let mut buffer = [0u8; 4096];
    loop {
        let events = inotify
            .read_events_blocking(&mut buffer)
            .expect("Failed to read inotify events");

        for event in events {
            match event.full_path() {
                Some(path) => println!("{}: {}", path.display(), event.mask),
                None       => println!("{}", event.mask),
            }

            if event.mask.contains(EventMask::Q_OVERFLOW) {
                eprintln!("Event queue overflowed, some events were lost");
            }
        }

        if watches.is_empty() {
            println!("No watches left");
            break;
        }
    }
}
