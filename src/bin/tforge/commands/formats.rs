use anyhow::Result;

use super::load::Session;
use crate::cli::FormatsArgs;
use crate::display::{print_attribute_kinds, print_formats};

pub fn run_formats(args: FormatsArgs) -> Result<()> {
    let session = Session::from_config(args.config.as_deref())?;

    print_formats(&session.formats);
    print_attribute_kinds(&session.attributes);

    Ok(())
}
