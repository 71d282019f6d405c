use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use indicatif_log_bridge::LogWrapper;
use log::{info, warn, LevelFilter};
use std::sync::OnceLock;
use std::time::{Duration, SystemTime};

static MULTI: OnceLock<MultiProgress> = OnceLock::new();


pub fn init(log_level: LevelFilter) {
    let logger = env_logger::builder()
        .filter_level(log_level)
        .parse_default_env() // Allow overriding log level through RUST_LOG env var
        .build();
    let level = logger.filter();

    let multi = MULTI.get_or_init(MultiProgress::new).clone();

    let wrapper = LogWrapper::new(multi, logger);
    if wrapper.try_init().is_err() {
        warn!("Logger was already initialized");
        return;
    }
    log::set_max_level(level);
}


pub fn run_with_spinner<'a, F, Out>(
    target: &'a str, task_desc: &'a str, function: F,
) -> Out where
    F: FnOnce() -> Out,
{
    let start_time = SystemTime::now();

    let pb = ProgressBar::new_spinner()
        .with_message(format!("{}...", task_desc))
        .with_style(ProgressStyle::with_template("{spinner:.white} [{elapsed:.green}] {msg}").unwrap());
    pb.enable_steady_tick(Duration::from_millis(100));

    // Set up connection with log library so that progress bars don't jump around
    let pb = attach(pb);

    let out = function();

    detach(&pb);
    let elapsed = indicatif::HumanDuration(start_time.elapsed().unwrap_or_default());
    info!(target: target, "{} finished (took {})", task_desc, elapsed);

    out
}

pub fn run_with_pb<'a, F, Out>(
    target: &'a str, task_desc: &'a str, total: u64, print_message: bool, function: F,
) -> Out where
    F: FnOnce(ProgressBar) -> Out,
{
    let start_time = SystemTime::now();

    let pb = ProgressBar::new(total)
        .with_message(format!("{}...", task_desc))
        .with_style(
            ProgressStyle::with_template("[{elapsed:.green}] {msg} [{wide_bar:.cyan/blue}] {human_pos}/{human_len} [{eta}]")
                .unwrap().progress_chars("=> ")
        );
    pb.enable_steady_tick(Duration::from_secs(1));

    let pb = attach(pb);

    let out = function(pb.clone());

    detach(&pb);
    if print_message {
        let elapsed = indicatif::HumanDuration(start_time.elapsed().unwrap_or_default());
        info!(target: target, "{} finished (took {})", task_desc, elapsed);
    }

    out
}

// Without `init` (in tests, for example) bars are drawn on their own
fn attach(pb: ProgressBar) -> ProgressBar {
    match MULTI.get() {
        Some(multi) => multi.add(pb),
        None => pb,
    }
}

fn detach(pb: &ProgressBar) {
    pb.finish_and_clear();
    if let Some(multi) = MULTI.get() {
        multi.remove(pb);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_without_init() {
        let out = run_with_spinner("test", "Adding", || 40 + 2);
        assert_eq!(out, 42);

        let counted = run_with_pb("test", "Counting", 3, false, |pb| {
            (0..3).for_each(|_| pb.inc(1));
            pb.position()
        });
        assert_eq!(counted, 3);
    }
}
