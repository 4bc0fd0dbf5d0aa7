use std::io::{self, Write};

use anyhow::{Context, Result};

use traj_forge::Universe;

use super::as_strs;
use super::load::{Session, file_label};
use crate::cli::InfoArgs;
use crate::display::{
    Context as DisplayContext, Progress, count_noun, print_attribute_columns, print_frame_info,
    print_topology_info,
};

const TOTAL_STEPS: u8 = 2;

pub fn run_info(args: InfoArgs, ctx: DisplayContext) -> Result<()> {
    let session = Session::from_config(args.input.config.as_deref())?;
    let mut progress = Progress::new(ctx.interactive, TOTAL_STEPS);

    progress.step("Reading topology");
    let (topology, format) = session.read_topology(&args.input)?;
    let read_substeps = [
        format!("Parse {} ({})", file_label(&args.input.topology), format),
        format!("Build {}", count_noun(topology.n_atoms(), "atom")),
    ];
    progress.complete_step("Reading topology", &as_strs(&read_substeps));

    progress.step("Loading first frame");
    let (source, label) = session.open_frames(&args.input)?;
    let source_format = source.format().to_string();
    let universe = Universe::new(topology, source).context("Topology and trajectory disagree")?;
    let frame_substeps = [format!("Open {label} ({source_format})")];
    progress.complete_step("Loading first frame", &as_strs(&frame_substeps));

    if ctx.interactive {
        print_topology_info(universe.topology(), &format);
        print_attribute_columns(universe.topology(), args.head);
        if let Some(frame) = universe.frame() {
            print_frame_info(frame, universe.n_frames());
        }
    } else {
        write_plain_summary(&universe)?;
    }

    progress.finish("Inspection complete");

    Ok(())
}

/// `key=value` lines for scripting.
fn write_plain_summary(universe: &Universe) -> Result<()> {
    let mut out = io::stdout().lock();
    let topology = universe.topology();

    writeln!(out, "atoms={}", topology.n_atoms())?;
    writeln!(out, "residues={}", topology.n_residues())?;
    writeln!(out, "segments={}", topology.n_segments())?;

    let mut names: Vec<&str> = topology.attributes().map(|a| a.name()).collect();
    names.sort_unstable();
    writeln!(out, "attributes={}", names.join(","))?;

    match universe.n_frames() {
        Some(n) => writeln!(out, "frames={n}")?,
        None => writeln!(out, "frames=unknown")?,
    }
    Ok(())
}
