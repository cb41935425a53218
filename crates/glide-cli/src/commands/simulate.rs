use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tracing::{info, warn};

use glide_core::AppConfig;
use glide_scroll::surface::ScrollSnapshot;
use glide_scroll::{SurfaceEvent, ThumbState};

use super::scenario::{Rig, ScenarioArgs};

#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub scenario: ScenarioArgs,
    /// Stop after this many host frames even if still animating
    #[arg(long, default_value_t = 1200)]
    pub frames: u32,
    /// Print one JSON line per render, then the summary
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FrameRecord {
    pub snapshot: ScrollSnapshot,
    pub progress: f64,
}

#[derive(Debug, Serialize)]
pub struct SimulationReport {
    #[serde(skip)]
    pub renders: Vec<FrameRecord>,
    pub host_frames: u64,
    pub elapsed_ms: f64,
    pub settled: bool,
    pub fps: f64,
    pub last: ScrollSnapshot,
    pub thumb: ThumbState,
}

/// Drive a scenario on a manual host until it settles or runs out of frames
pub fn simulate(config: &AppConfig, args: &SimulateArgs) -> Result<SimulationReport> {
    let rig = Rig::build(config, &args.scenario)?;

    let renders = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&renders);
    let scrollbar = rig.scrollbar.clone();
    rig.surface.on(move |event| {
        if let SurfaceEvent::Render(snapshot) = event {
            sink.borrow_mut().push(FrameRecord {
                snapshot: *snapshot,
                progress: scrollbar.thumb_state().progress,
            });
        }
    });

    rig.apply_inputs(&args.scenario);

    let frame_ms = args.scenario.frame_ms();
    let mut elapsed_ms = 0.0;
    for _ in 0..args.frames {
        if !rig.surface.is_animating() {
            break;
        }
        rig.host.advance(frame_ms);
        elapsed_ms += frame_ms;
    }

    let settled = !rig.surface.is_animating();
    if !settled {
        warn!(frames = args.frames, "Surface still animating after the frame limit");
    }

    let report = SimulationReport {
        renders: renders.take(),
        host_frames: rig.host.frames_fired(),
        elapsed_ms,
        settled,
        fps: rig.surface.clock().fps(),
        last: rig.surface.snapshot(),
        thumb: rig.scrollbar.thumb_state(),
    };

    rig.scrollbar.destroy();
    rig.surface.destroy();
    Ok(report)
}

pub fn run(config: &AppConfig, args: SimulateArgs) -> Result<()> {
    let report = simulate(config, &args)?;

    if args.json {
        for record in &report.renders {
            println!("{}", serde_json::to_string(record)?);
        }
        println!("{}", serde_json::to_string(&report)?);
        return Ok(());
    }

    info!(renders = report.renders.len(), "Simulation finished");
    for record in &report.renders {
        let frame = record
            .snapshot
            .frame
            .map_or_else(|| "-".to_string(), |index| index.to_string());
        println!(
            "{:>5}  top {:>9.2}  target {:>9.2}  bar {:>5.1}%",
            frame,
            record.snapshot.current.top,
            record.snapshot.target.top,
            record.progress * 100.0
        );
    }

    println!();
    println!(
        "{} renders over {} host frames ({:.0} ms, {:.0} fps)",
        report.renders.len(),
        report.host_frames,
        report.elapsed_ms,
        report.fps
    );
    println!(
        "Final position {:.2} of {:.2}{}",
        report.last.current.top,
        report.last.bounds.max_top(),
        if report.settled { "" } else { " (still moving)" }
    );

    Ok(())
}
