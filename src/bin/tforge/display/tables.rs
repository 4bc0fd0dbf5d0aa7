use std::io::{self, Write};

use traj_forge::{AttributeRegistry, FormatRegistry, Frame, Level, Topology};

use super::text::truncate;

const INDENT: &str = "      ";

const BOX_INNER_WIDTH: usize = 62;
const SAFE_TABLE_WIDTH: usize = BOX_INNER_WIDTH - INDENT.len();

pub fn print_topology_info(topology: &Topology, format: &str) {
    let stderr = io::stderr();
    let mut out = stderr.lock();

    let rows = vec![
        ("Format", format.to_string()),
        ("Atoms", topology.n_atoms().to_string()),
        ("Residues", topology.n_residues().to_string()),
        ("Segments", topology.n_segments().to_string()),
        ("Attributes", topology.attributes().count().to_string()),
    ];

    print_kv_table(&mut out, "Topology Summary", &rows);
}

pub fn print_frame_info(frame: &Frame, n_frames: Option<usize>) {
    let stderr = io::stderr();
    let mut out = stderr.lock();

    let mut rows = vec![
        ("Frame", frame.index.to_string()),
        (
            "Frames",
            n_frames.map_or_else(|| "unknown (stream)".to_string(), |n| n.to_string()),
        ),
        ("Velocities", yes_no(frame.has_velocities()).to_string()),
        ("Forces", yes_no(frame.has_forces()).to_string()),
    ];

    if let Some(cell) = &frame.unit_cell {
        let [a, b, c] = cell.lengths();
        let [alpha, beta, gamma] = cell.angles();
        rows.push(("Box", format!("{a:.2} × {b:.2} × {c:.2}")));
        rows.push((
            "Angles (α β γ)",
            format!("{alpha:.1}° {beta:.1}° {gamma:.1}°"),
        ));
    }

    if let Some(center) = centroid(&frame.positions) {
        rows.push((
            "Centroid",
            format!("{:.3} {:.3} {:.3}", center[0], center[1], center[2]),
        ));
    }

    print_kv_table(&mut out, "First Frame", &rows);
}

/// Declared attribute columns of a topology, with the first `head` values.
pub fn print_attribute_columns(topology: &Topology, head: usize) {
    let stderr = io::stderr();
    let mut out = stderr.lock();

    let mut columns: Vec<_> = topology.attributes().collect();
    columns.sort_by(|a, b| a.level().cmp(&b.level()).then(a.name().cmp(b.name())));

    let rows: Vec<Vec<String>> = columns
        .iter()
        .map(|column| {
            let sample = (0..column.len().min(head))
                .filter_map(|i| column.get(i))
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            vec![
                column.name().to_string(),
                column.level().to_string(),
                column.spec().element_type.to_string(),
                if head == 0 { column.len().to_string() } else { sample },
            ]
        })
        .collect();

    let last = if head == 0 { "Count" } else { "Values" };
    print_table(
        &mut out,
        "Attribute Columns",
        &[("Name", 10), ("Level", 8), ("Type", 8), (last, 0)],
        &rows,
    );
}

pub fn print_attribute_kinds(registry: &AttributeRegistry) {
    let mut out = io::stdout().lock();

    let rows: Vec<Vec<String>> = Level::ALL
        .iter()
        .flat_map(|level| registry.list_by_level(*level))
        .map(|spec| {
            vec![
                spec.name.clone(),
                spec.singular.clone(),
                spec.level.to_string(),
                spec.element_type.to_string(),
                yes_no(spec.mutable).to_string(),
            ]
        })
        .collect();

    print_table(
        &mut out,
        "Attribute Kinds",
        &[("Name", 10), ("Singular", 9), ("Level", 7), ("Type", 7), ("Mutable", 0)],
        &rows,
    );
}

pub fn print_formats(formats: &FormatRegistry) {
    let mut out = io::stdout().lock();

    let mut tags: Vec<&str> = formats.parser_formats().chain(formats.source_formats()).collect();
    tags.sort_unstable();
    tags.dedup();

    let rows: Vec<Vec<String>> = tags
        .iter()
        .map(|tag| {
            vec![
                tag.to_string(),
                yes_no(formats.parser_formats().any(|t| t == *tag)).to_string(),
                yes_no(formats.source_formats().any(|t| t == *tag)).to_string(),
                formats.extensions(tag).join(", "),
            ]
        })
        .collect();

    print_table(
        &mut out,
        "Formats",
        &[("Tag", 8), ("Topology", 8), ("Frames", 6), ("Extensions", 0)],
        &rows,
    );
}

pub fn print_kv(title: &str, rows: &[(&str, String)]) {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    print_kv_table(&mut out, title, rows);
}

/// Box table; a column width of 0 takes the remaining space.
fn print_table(out: &mut impl Write, title: &str, columns: &[(&str, usize)], rows: &[Vec<String>]) {
    let fixed: usize = columns.iter().map(|(_, w)| *w).sum();
    let sep_overhead = 3 * columns.len() + 1;
    let widths: Vec<usize> = columns
        .iter()
        .map(|(header, w)| match w {
            0 => SAFE_TABLE_WIDTH
                .saturating_sub(fixed + sep_overhead)
                .max(header.chars().count()),
            w => *w,
        })
        .collect();

    let rule = |left: &str, mid: &str, right: &str| {
        let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
        format!("{INDENT}{left}{}{right}", segments.join(mid))
    };
    let line = |cells: &[&str]| {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!(" {:<w$} ", truncate(cell, *w), w = *w))
            .collect();
        format!("{INDENT}│{}│", padded.join("│"))
    };

    let _ = writeln!(
        out,
        "{}┌─ {} ─┐",
        INDENT,
        truncate(title, SAFE_TABLE_WIDTH - 6)
    );
    let _ = writeln!(out, "{}", rule("┌", "┬", "┐"));
    let headers: Vec<&str> = columns.iter().map(|(h, _)| *h).collect();
    let _ = writeln!(out, "{}", line(&headers));
    let _ = writeln!(out, "{}", rule("├", "┼", "┤"));

    if rows.is_empty() {
        let mut empty = vec!["(none)"];
        empty.resize(columns.len(), "");
        let _ = writeln!(out, "{}", line(&empty));
    }
    for row in rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        let _ = writeln!(out, "{}", line(&cells));
    }

    let _ = writeln!(out, "{}", rule("└", "┴", "┘"));
}

fn print_kv_table(out: &mut impl Write, title: &str, rows: &[(&str, String)]) {
    let key_w = 16usize;
    let sep_overhead = 6;
    let val_w = SAFE_TABLE_WIDTH.saturating_sub(key_w + sep_overhead);

    let _ = writeln!(
        out,
        "{}┌─ {} ─┐",
        INDENT,
        truncate(title, SAFE_TABLE_WIDTH - 6)
    );
    let _ = writeln!(
        out,
        "{}┌{k_line}┬{v_line}┐",
        INDENT,
        k_line = "─".repeat(key_w + 2),
        v_line = "─".repeat(val_w + 2)
    );
    for (key, val) in rows {
        let _ = writeln!(
            out,
            "{}│ {:<key_w$} │ {:>val_w$} │",
            INDENT,
            truncate(key, key_w),
            truncate(val, val_w),
            key_w = key_w,
            val_w = val_w
        );
    }
    let _ = writeln!(
        out,
        "{}└{k_line}┴{v_line}┘",
        INDENT,
        k_line = "─".repeat(key_w + 2),
        v_line = "─".repeat(val_w + 2)
    );
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

/// Mean position; `None` for an empty frame.
pub fn centroid(positions: &[[f32; 3]]) -> Option<[f64; 3]> {
    if positions.is_empty() {
        return None;
    }
    let mut sum = [0.0f64; 3];
    for p in positions {
        for (s, x) in sum.iter_mut().zip(p) {
            *s += f64::from(*x);
        }
    }
    let n = positions.len() as f64;
    Some(sum.map(|s| s / n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centroid_of_positions() {
        assert_eq!(centroid(&[]), None);
        assert_eq!(
            centroid(&[[0.0, 0.0, 0.0], [2.0, 4.0, -2.0]]),
            Some([1.0, 2.0, -1.0])
        );
    }

    #[test]
    fn table_rows_fit_the_box() {
        let mut buf = Vec::new();
        print_table(
            &mut buf,
            "Formats",
            &[("Tag", 8), ("Extensions", 0)],
            &[vec!["xyz".into(), "extxyz, xyz".into()]],
        );
        let text = String::from_utf8(buf).unwrap();
        let widths: Vec<usize> = text.lines().skip(1).map(|l| l.chars().count()).collect();
        assert!(widths.windows(2).all(|w| w[0] == w[1]));
        assert!(text.contains("extxyz, xyz"));
    }
}
