use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::debug;

use traj_forge::{Frame, Universe};

use super::as_strs;
use super::load::{Session, file_label};
use crate::cli::ScanArgs;
use crate::display::{Context as DisplayContext, Progress, centroid, count_noun, print_kv};
use crate::io::stdout_is_tty;

const TOTAL_STEPS: u8 = 3;

pub fn run_scan(args: ScanArgs, ctx: DisplayContext) -> Result<()> {
    let session = Session::from_config(args.input.config.as_deref())?;
    let mut progress = Progress::new(ctx.interactive, TOTAL_STEPS);

    progress.step("Reading topology");
    let (topology, format) = session.read_topology(&args.input)?;
    let read_substeps = [format!(
        "Parse {} ({}), {}",
        file_label(&args.input.topology),
        format,
        count_noun(topology.n_atoms(), "atom")
    )];
    progress.complete_step("Reading topology", &as_strs(&read_substeps));

    progress.step("Opening trajectory");
    let (source, label) = session.open_frames(&args.input)?;
    let mut universe =
        Universe::new(topology, source).context("Topology and trajectory disagree")?;
    if args.start > 0 {
        universe
            .seek(args.start)
            .with_context(|| format!("Failed to seek to frame {}", args.start))?;
    }
    let open_substeps = [match universe.n_frames() {
        Some(n) => format!("Open {label}, {n} frames"),
        None => format!("Open {label}, streaming"),
    }];
    progress.complete_step("Opening trajectory", &as_strs(&open_substeps));

    let expected = universe
        .n_frames()
        .map(|n| visits(args.start, args.stop.unwrap_or(n).min(n), args.stride));
    let bar = progress.frames("Scanning frames", expected);

    let per_frame_output = !(ctx.interactive && stdout_is_tty());
    let mut out = io::stdout().lock();
    let mut stats = ScanStats::default();

    while let Some(frame) = universe.frame() {
        if args.stop.is_some_and(|stop| frame.index >= stop) {
            break;
        }
        if (frame.index.saturating_sub(args.start)) % args.stride == 0 {
            stats.record(frame);
            if per_frame_output {
                write_frame_line(&mut out, frame)?;
            }
            bar.inc(1);
        }
        if universe.next_frame()?.is_none() {
            break;
        }
    }
    bar.finish_and_clear();
    debug!(visited = stats.visited, "scan finished");

    let scan_substeps = [format!(
        "Visited {} of {}",
        count_noun(stats.visited, "frame"),
        frames_text(expected)
    )];
    progress.complete_step("Scanning frames", &as_strs(&scan_substeps));

    if ctx.interactive {
        print_kv("Scan Summary", &stats.rows());
    }

    progress.finish("Scan complete");

    Ok(())
}

/// Number of indices in `start..stop` stepping by `stride`.
fn visits(start: usize, stop: usize, stride: usize) -> usize {
    stop.saturating_sub(start).div_ceil(stride)
}

fn frames_text(expected: Option<usize>) -> String {
    match expected {
        Some(n) => format!("{n} expected frames"),
        None => "a stream".to_string(),
    }
}

/// Tab-separated `index cx cy cz`, one line per visited frame.
fn write_frame_line(out: &mut impl Write, frame: &Frame) -> io::Result<()> {
    match centroid(&frame.positions) {
        Some([x, y, z]) => writeln!(out, "{}\t{x:.4}\t{y:.4}\t{z:.4}", frame.index),
        None => writeln!(out, "{}", frame.index),
    }
}

#[derive(Debug, Default)]
struct ScanStats {
    visited: usize,
    first: Option<usize>,
    last: Option<usize>,
    with_cell: usize,
    first_centroid: Option<[f64; 3]>,
    last_centroid: Option<[f64; 3]>,
    min: Option<[f32; 3]>,
    max: Option<[f32; 3]>,
}

impl ScanStats {
    fn record(&mut self, frame: &Frame) {
        self.visited += 1;
        self.first.get_or_insert(frame.index);
        self.last = Some(frame.index);
        if frame.unit_cell.is_some() {
            self.with_cell += 1;
        }

        let center = centroid(&frame.positions);
        if self.first_centroid.is_none() {
            self.first_centroid = center;
        }
        self.last_centroid = center;

        for p in &frame.positions {
            let min = self.min.get_or_insert(*p);
            let max = self.max.get_or_insert(*p);
            for axis in 0..3 {
                min[axis] = min[axis].min(p[axis]);
                max[axis] = max[axis].max(p[axis]);
            }
        }
    }

    fn drift(&self) -> Option<f64> {
        let (a, b) = (self.first_centroid?, self.last_centroid?);
        Some(
            a.iter()
                .zip(&b)
                .map(|(x, y)| (y - x).powi(2))
                .sum::<f64>()
                .sqrt(),
        )
    }

    fn rows(&self) -> Vec<(&'static str, String)> {
        let mut rows = vec![("Frames visited", self.visited.to_string())];
        if let (Some(first), Some(last)) = (self.first, self.last) {
            rows.push(("Range", format!("{first} → {last}")));
        }
        rows.push(("With unit cell", self.with_cell.to_string()));
        if let (Some(min), Some(max)) = (self.min, self.max) {
            rows.push((
                "Extent",
                format!(
                    "{:.2} × {:.2} × {:.2}",
                    max[0] - min[0],
                    max[1] - min[1],
                    max[2] - min[2]
                ),
            ));
        }
        if let Some(drift) = self.drift() {
            rows.push(("Centroid drift", format!("{drift:.4}")));
        }
        rows
    }
}
