use std::io::{self, Write};

use anyhow::Error;

use super::text::wrap;

#[rustfmt::skip]
pub fn print_error(err: &Error) {
    let mut stderr = io::stderr().lock();

    let _ = writeln!(stderr);
    let _ = writeln!(stderr, "   ╔══════════════════════════════════════════════════════════════╗");
    let _ = writeln!(stderr, "   ║  ✗ Error                                                     ║");
    let _ = writeln!(stderr, "   ╟──────────────────────────────────────────────────────────────╢");

    for line in wrap(&err.to_string(), 59) {
        let _ = writeln!(stderr, "   ║  {:<59} ║", line);
    }

    let mut source = err.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "   ╟──────────────────────────────────────────────────────────────╢");
        let _ = writeln!(stderr, "   ║  Caused by:                                                  ║");
        for line in wrap(&cause.to_string(), 57) {
            let _ = writeln!(stderr, "   ║    {:<57} ║", line);
        }
        source = cause.source();
    }

    if let Some(hints) = HintCollector::collect(err) {
        let _ = writeln!(stderr, "   ╟──────────────────────────────────────────────────────────────╢");
        let _ = writeln!(stderr, "   ║  Hints:                                                      ║");
        for hint in hints {
            let wrapped = wrap(&hint, 55);
            if let Some((first, rest)) = wrapped.split_first() {
                let _ = writeln!(stderr, "   ║    • {:<55} ║", first);
                for line in rest {
                    let _ = writeln!(stderr, "   ║      {:<55} ║", line);
                }
            }
        }
    }

    let _ = writeln!(stderr, "   ╚══════════════════════════════════════════════════════════════╝");
    let _ = writeln!(stderr);
}

struct HintCollector {
    hints: Vec<String>,
    has_typed_hints: bool,
}

impl HintCollector {
    fn new() -> Self {
        Self {
            hints: Vec::new(),
            has_typed_hints: false,
        }
    }

    fn collect(err: &Error) -> Option<Vec<String>> {
        let mut collector = Self::new();

        collector.collect_config_hints(err);
        collector.collect_io_hints(err);
        collector.collect_model_hints(err);

        if !collector.has_typed_hints {
            collector.collect_fallback_hints(err);
        }

        if collector.hints.is_empty() {
            None
        } else {
            Some(collector.hints)
        }
    }

    fn add(&mut self, hint: impl Into<String>) {
        self.hints.push(hint.into());
    }

    fn mark_typed(&mut self) {
        self.has_typed_hints = true;
    }

    fn collect_config_hints(&mut self, err: &Error) {
        use traj_forge::ConfigError;

        let Some(config_err) = find_in_chain::<ConfigError>(err) else {
            return;
        };

        match config_err {
            ConfigError::Read { source, .. } => {
                self.mark_typed();
                self.collect_std_io_hints(source);
            }

            ConfigError::Parse(_) => {
                self.mark_typed();
                self.add("The config file has invalid TOML syntax or an unknown value");
                self.add("Levels are atom, residue or segment");
                self.add("Types are int, float, string or vector3");
            }

            // The wrapped model or format error carries the hints.
            ConfigError::Attribute(_) | ConfigError::Format(_) => {}
        }
    }

    fn collect_io_hints(&mut self, err: &Error) {
        use traj_forge::io::Error as IoError;

        let Some(io_err) = find_in_chain::<IoError>(err) else {
            return;
        };

        self.mark_typed();

        match io_err {
            IoError::Io { source } => {
                self.collect_std_io_hints(source);
            }

            IoError::Malformed {
                format, line, field, ..
            } => {
                match field {
                    Some(field) => self.add(format!(
                        "The {format} reader stopped at line {line}, field {field}"
                    )),
                    None => self.add(format!("The {format} reader stopped at line {line}")),
                }
                self.add("Inspect the input around that line for malformed entries");
                self.add_format_specific_hints(format);
            }

            // Handled by the model hints.
            IoError::Model(_) => {}

            IoError::OutOfRange { n_frames, .. } => {
                self.add(format!(
                    "Valid frame indices are 0 to {}",
                    n_frames.saturating_sub(1)
                ));
                self.add("Check --start against the frame count shown by 'tforge info'");
            }

            IoError::SeekNotSupported { .. } => {
                self.add("Streams can only be read forward");
                self.add("Write the trajectory to a file to enable random access");
            }

            IoError::UnsupportedTopologyFormat(tag) | IoError::UnsupportedFrameFormat(tag) => {
                self.add(format!("No reader is registered under '{tag}'"));
                self.add("Run 'tforge formats' to list the registered formats");
            }

            IoError::InvalidLayout(_) => {
                self.add("Check the columns list in the [csv] section of the config");
                self.add("Every column must be an atom-level attribute or x, y, z");
                self.add("Declare custom columns in [[attributes]] first");
            }

            IoError::UnknownFormat(_) => {
                self.add("The file extension did not match a registered format");
                self.add("Use --topology-format or --trajectory-format to name one");
                self.add("Run 'tforge formats' to list the registered formats");
            }

            IoError::DuplicateFormat(tag) => {
                self.add(format!("Format '{tag}' was registered twice"));
            }
        }
    }

    fn add_format_specific_hints(&mut self, format: &str) {
        match format {
            "csv" => {
                self.add("CSV: every line needs one field per configured column");
                self.add("CSV: blank lines are not allowed between rows");
            }

            "xyz" => {
                self.add("XYZ: each frame starts with an atom count and a comment line");
                self.add("XYZ: atom lines are 'symbol x y z'");
                self.add("XYZ: every frame must have the same number of atoms");
                self.add("XYZ: unknown_elements = \"omit\" accepts unknown atom names");
            }

            _ => {}
        }
    }

    fn collect_model_hints(&mut self, err: &Error) {
        use traj_forge::ModelError;

        let Some(model_err) = find_model_error(err) else {
            return;
        };

        self.mark_typed();

        match model_err {
            ModelError::DuplicateAttribute(name) => {
                self.add(format!("'{name}' clashes with an existing attribute kind"));
                self.add("Pick another name (and singular) in [[attributes]]");
            }

            ModelError::NotFound { name, scope } => {
                if *scope == "registry" {
                    self.add(format!("Attribute kind '{name}' is not registered"));
                    self.add("Declare it in an [[attributes]] table of the config");
                } else {
                    self.add(format!("The topology has no '{name}' column"));
                }
            }

            ModelError::CardinalityMismatch { level, expected, .. } => {
                self.add(format!(
                    "Each {level}-level attribute needs exactly {expected} values"
                ));
            }

            ModelError::TypeMismatch { expected, .. } => {
                self.add(format!("Supply {expected} values for this attribute"));
            }

            ModelError::ReadOnly(_) => {
                self.add("Declare the attribute with mutable = true to allow edits");
            }

            ModelError::EntityOutOfRange { .. } | ModelError::ContainmentOutOfRange { .. } => {
                self.add("The residue or segment grouping is inconsistent");
                self.add("Check the grouping setting in the config");
            }

            ModelError::FrameTopologyMismatch { .. } => {
                self.add("The trajectory does not describe the same atoms as the topology");
                self.add("Check that both files come from the same system");
            }
        }
    }

    fn collect_std_io_hints(&mut self, source: &std::io::Error) {
        use std::io::ErrorKind;

        match source.kind() {
            ErrorKind::NotFound => {
                self.add("The input path does not exist");
                self.add("Input and config paths are relative to the working directory");
            }

            ErrorKind::PermissionDenied => {
                self.add("The input is not readable by the current user");
            }

            ErrorKind::InvalidData => {
                self.add("The input is not UTF-8 text");
                self.add("Binary trajectory formats need their own reader plug-in");
            }

            ErrorKind::UnexpectedEof => {
                self.add("The input ended in the middle of a record");
                self.add("A simulation may still be writing this file");
            }

            ErrorKind::BrokenPipe => {
                self.add("The process feeding stdin exited early");
            }

            _ => {
                self.add(format!("Reading failed ({})", source.kind()));
            }
        }
    }

    fn collect_fallback_hints(&mut self, err: &Error) {
        let msg = error_chain_text(err);

        if msg.contains("terminal") || msg.contains("stdin") || msg.contains("tty") {
            self.add("Standard input is a terminal");
            self.add("Pipe an XYZ trajectory in when using -t -");
            return;
        }

        if msg.contains("no such file") || msg.contains("not found") {
            self.add("One of the input paths does not exist");
            return;
        }

        if msg.contains("permission denied") {
            self.add("One of the inputs is not readable by the current user");
        }
    }
}

fn find_in_chain<T>(err: &Error) -> Option<&T>
where
    T: std::error::Error + Send + Sync + 'static,
{
    err.chain().find_map(|cause| cause.downcast_ref::<T>())
}

/// Model errors wrapped transparently do not appear as their own link in the chain.
fn find_model_error(err: &Error) -> Option<&traj_forge::ModelError> {
    use traj_forge::io::Error as IoError;
    use traj_forge::{ConfigError, ModelError};

    err.chain().find_map(|cause| {
        cause
            .downcast_ref::<ModelError>()
            .or_else(|| cause.downcast_ref::<IoError>().and_then(IoError::as_model))
            .or_else(|| match cause.downcast_ref::<ConfigError>() {
                Some(ConfigError::Attribute(inner)) => Some(inner),
                _ => None,
            })
    })
}

fn error_chain_text(err: &Error) -> String {
    let mut text = String::new();

    text.push_str(&err.to_string());

    let mut source = err.source();
    while let Some(cause) = source {
        text.push('\n');
        text.push_str(&cause.to_string());
        source = cause.source();
    }

    text.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    fn hints_for(err: Error) -> Vec<String> {
        HintCollector::collect(&err).unwrap_or_default()
    }

    #[test]
    fn malformed_input_names_position_and_format() {
        let err = Error::new(traj_forge::io::Error::malformed_field("csv", 4, 2, "bad mass"))
            .context("failed to read topology");
        let hints = hints_for(err);
        assert!(hints[0].contains("line 4, field 2"));
        assert!(hints.iter().any(|h| h.starts_with("CSV:")));
    }

    #[test]
    fn model_errors_are_found_through_format_errors() {
        let model = traj_forge::ModelError::FrameTopologyMismatch {
            field: "positions",
            expected: 14,
            found: 13,
        };
        let err = Error::new(traj_forge::io::Error::from(model));
        let hints = hints_for(err);
        assert!(hints.iter().any(|h| h.contains("same atoms")));
    }

    #[test]
    fn untyped_errors_fall_back_to_message_hints() {
        let err = anyhow::anyhow!("refusing to read a trajectory from a terminal on stdin");
        let hints = hints_for(err);
        assert!(hints.iter().any(|h| h.contains("-t -")));
    }
}
