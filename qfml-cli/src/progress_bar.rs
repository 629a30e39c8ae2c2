use std::sync::{Arc, Mutex};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use qfml::progress::{ByteNum, ProgressNotifier};

#[derive(Debug)]
struct LoadProgressBarState {
    length: u64,
    bytes: bool,
    initialized: bool,
}

impl LoadProgressBarState {
    fn new() -> Self {
        Self {
            length: 0,
            bytes: false,
            initialized: false,
        }
    }
}

/// Spinner shown while the tables are read, and a bar while tip states are
/// registered.
#[derive(Debug, Clone)]
pub(crate) struct LoadProgressBar {
    bar: ProgressBar,
    state: Arc<Mutex<LoadProgressBarState>>,
}

impl LoadProgressBar {
    pub fn new() -> LoadProgressBar {
        let init_bar = ProgressBar::hidden();
        init_bar.set_style(ProgressStyle::default_spinner());
        init_bar.enable_steady_tick(Duration::from_millis(50));
        init_bar.set_message("Parsing tree...");

        Self {
            bar: init_bar,
            state: Arc::new(Mutex::new(LoadProgressBarState::new())),
        }
    }

    pub fn show(&self) {
        self.bar.set_draw_target(ProgressDrawTarget::stderr());
    }

    pub fn is_hidden(&self) -> bool {
        self.bar.is_hidden()
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear()
    }

    #[inline]
    fn init(&self) {
        let mut state = self.state.lock().unwrap();
        if state.initialized {
            return;
        }

        self.bar.set_length(state.length);
        self.bar.set_position(0);

        let template = match (state.bytes, state.length == 0) {
            (true, true) => "{spinner} {bytes}/? ({bytes_per_sec}) {msg}",
            (true, false) => "{wide_bar} {bytes}/{total_bytes} [ETA {eta}]",
            (false, true) => "{spinner} {pos}/? tips ({per_sec}) {msg}",
            (false, false) => "{wide_bar} {pos}/{len} tips [ETA {eta}]",
        };
        let style = if state.length == 0 {
            ProgressStyle::default_spinner()
        } else {
            ProgressStyle::default_bar()
        };
        self.bar.set_style(
            style
                .template(template)
                .expect("Invalid progress bar template"),
        );
        self.bar.set_message("");
        state.initialized = true;
    }

    pub fn set_total_bytes(&self, length: u64) {
        let mut state = self.state.lock().unwrap();

        state.initialized = false;
        state.bytes = true;
        state.length = length;
    }

    pub fn set_length(&self, length: u64) {
        let mut state = self.state.lock().unwrap();

        state.initialized = false;
        state.bytes = false;
        state.length = length;
    }

    pub fn inc(&self, value: u64) {
        self.init();
        self.bar.inc(value);
    }

    pub fn println<I: AsRef<str>>(&self, msg: I) {
        self.bar.println(msg);
    }
}

impl ProgressNotifier for LoadProgressBar {
    fn processed_bytes(&self, bytes: ByteNum) {
        self.inc(bytes.get() as u64);
    }

    fn set_tip_total(&self, num_tips: u64) {
        self.set_length(num_tips);
    }

    fn tip_registered(&self) {
        self.inc(1);
    }
}
