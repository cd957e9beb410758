use coloverlap::engine::progress::{Progress, ProgressCallback};
use indicatif::{ProgressBar, ProgressState, ProgressStyle};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

const SPINNER_TICK_MS: u64 = 80;

struct BarState {
    pb: ProgressBar,
    /// Candidates per reference, learned when the first reference finishes.
    candidates: Option<u64>,
}

/// Renders scoring progress on stderr.
///
/// The candidate count is unknown until the first reference has streamed
/// every batch, so the first reference shows a spinner with a running count
/// and later references show a bar.
#[derive(Clone)]
pub struct CliProgressHandler {
    state: Arc<Mutex<BarState>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        let pb = ProgressBar::new(0)
            .with_style(Self::spinner_style())
            .with_message("Initializing...");
        pb.set_draw_target(indicatif::ProgressDrawTarget::stderr());
        pb.finish_and_clear();

        Self {
            state: Arc::new(Mutex::new(BarState {
                pb,
                candidates: None,
            })),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let state = self.state.clone();

        Box::new(move |progress: Progress| {
            let Ok(mut guard) = state.lock() else {
                warn!("Progress bar mutex was poisoned. Cannot update progress.");
                return;
            };
            let BarState { pb, candidates } = &mut *guard;

            match progress {
                Progress::PhaseStart { name } => {
                    pb.reset();
                    pb.set_length(0);
                    pb.set_style(Self::spinner_style());
                    pb.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
                    pb.set_message(name.to_string());
                }
                Progress::PhaseFinish => {
                    pb.disable_steady_tick();
                    pb.finish_with_message("✓ Done");
                }
                Progress::ReferenceStart { index, title } => {
                    pb.reset();
                    pb.set_position(0);
                    match *candidates {
                        Some(total) => {
                            pb.disable_steady_tick();
                            pb.set_length(total);
                            pb.set_style(Self::bar_style());
                        }
                        None => {
                            pb.set_length(0);
                            pb.set_style(Self::counter_style());
                            pb.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
                        }
                    }
                    pb.set_message(format!("ref {} ({})", index + 1, title));
                }
                Progress::CandidatesScored { count } => {
                    pb.inc(count);
                }
                Progress::ReferenceFinish { candidates: n, .. } => {
                    let n = n as u64;
                    candidates.get_or_insert(n);
                    pb.set_length(n);
                    pb.set_position(n);
                }
                Progress::Message(msg) => {
                    if !pb.is_finished() {
                        pb.println(format!("  {}", msg));
                    } else {
                        pb.set_message(msg);
                    }
                }
            }
        })
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .expect("Failed to create spinner style template")
    }

    fn counter_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg:<24} {pos} candidates")
            .expect("Failed to create counter style template")
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template("{msg:<24} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .expect("Failed to create bar style template")
            .with_key(
                "eta",
                |state: &ProgressState, w: &mut dyn std::fmt::Write| {
                    let _ = write!(w, "{:.1}s", state.eta().as_secs_f64());
                },
            )
            .progress_chars("##-")
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}
