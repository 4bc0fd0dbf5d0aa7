mod formats;
mod info;
mod load;
mod scan;

use formats::run_formats;
use info::run_info;
use scan::run_scan;

use anyhow::Result;

use crate::cli::Command;
use crate::display::Context;

pub fn dispatch(command: Command, ctx: Context) -> Result<()> {
    match command {
        Command::Info(args) => run_info(args, ctx),
        Command::Scan(args) => run_scan(args, ctx),
        Command::Formats(args) => run_formats(args),
    }
}

fn as_strs(items: &[String]) -> Vec<&str> {
    items.iter().map(String::as_str).collect()
}
