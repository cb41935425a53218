use std::future::Future;
use std::io::Write;
use std::time::Duration;

use anyhow::{ensure, Context as _, Result};
use clap::Args;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

use glide_core::AppConfig;

use super::scenario::{Rig, ScenarioArgs};

const BAR_WIDTH: usize = 40;

#[derive(Args, Debug, Clone)]
pub struct WatchArgs {
    #[command(flatten)]
    pub scenario: ScenarioArgs,
    /// Give up after this many seconds
    #[arg(long, default_value_t = 10.0)]
    pub timeout: f64,
}

impl WatchArgs {
    pub fn timeout(&self) -> Result<Duration> {
        ensure!(
            self.timeout >= 0.0,
            "--timeout must not be negative, got {}",
            self.timeout
        );
        Duration::try_from_secs_f64(self.timeout)
            .with_context(|| format!("--timeout {} is not a usable duration", self.timeout))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchOutcome {
    Settled,
    Interrupted,
    TimedOut,
}

fn progress_line(rig: &Rig) -> String {
    let progress = rig.scrollbar.thumb_state().progress;
    let filled = (progress * BAR_WIDTH as f64).round() as usize;
    format!(
        "[{}{}] {:>5.1}%  top {:>9.2}",
        "#".repeat(filled.min(BAR_WIDTH)),
        "-".repeat(BAR_WIDTH - filled.min(BAR_WIDTH)),
        progress * 100.0,
        rig.surface.scroll_top()
    )
}

/// Pump host frames at the display rate until the surface settles
///
/// Stops early when `on_frame` fails.
pub async fn animate<F>(
    rig: &Rig,
    args: &WatchArgs,
    shutdown: F,
    mut on_frame: impl FnMut(&Rig) -> std::io::Result<()>,
) -> Result<WatchOutcome>
where
    F: Future<Output = ()>,
{
    args.scenario.validate()?;
    let period = Duration::from_secs_f64(args.scenario.frame_ms() / 1000.0);
    let mut interval = time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let started = Instant::now();
    let deadline = time::sleep(args.timeout()?);
    tokio::pin!(shutdown, deadline);

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => return Ok(WatchOutcome::Interrupted),
            _ = &mut deadline => return Ok(WatchOutcome::TimedOut),
            _ = interval.tick() => {
                rig.host.advance_to(started.elapsed().as_secs_f64() * 1000.0);
                on_frame(rig).context("Failed to write progress")?;
                if !rig.surface.is_animating() {
                    return Ok(WatchOutcome::Settled);
                }
            }
        }
    }
}

pub async fn run(config: &AppConfig, args: WatchArgs) -> Result<()> {
    args.timeout()?;
    let rig = Rig::build(config, &args.scenario)?;
    rig.apply_inputs(&args.scenario);
    debug!(target_top = rig.surface.target_top(), "Watching scroll");

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
    };

    let mut stdout = std::io::stdout();
    let outcome = animate(&rig, &args, shutdown, |rig| {
        write!(stdout, "\r{}", progress_line(rig))?;
        stdout.flush()
    })
    .await;

    match &outcome {
        Ok(WatchOutcome::Settled) => info!(
            top = rig.surface.scroll_top(),
            frames = rig.surface.clock().index(),
            "Settled"
        ),
        Ok(WatchOutcome::Interrupted) => info!("Interrupted"),
        Ok(WatchOutcome::TimedOut) => info!(timeout = args.timeout, "Timed out while animating"),
        Err(_) => {}
    }

    rig.scrollbar.destroy();
    rig.surface.destroy();
    outcome?;
    writeln!(stdout)?;
    Ok(())
}
