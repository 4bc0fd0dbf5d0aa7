//! Element symbols and standard atomic masses for guessing per-atom data
//! that text formats leave out.

/// `(symbol, standard atomic mass)` for the elements commonly found in
/// biomolecular and materials simulations.
const ELEMENTS: &[(&str, f64)] = &[
    ("H", 1.008),
    ("He", 4.0026),
    ("Li", 6.94),
    ("Be", 9.0122),
    ("B", 10.81),
    ("C", 12.011),
    ("N", 14.007),
    ("O", 15.999),
    ("F", 18.998),
    ("Ne", 20.18),
    ("Na", 22.99),
    ("Mg", 24.305),
    ("Al", 26.982),
    ("Si", 28.085),
    ("P", 30.974),
    ("S", 32.06),
    ("Cl", 35.45),
    ("Ar", 39.948),
    ("K", 39.098),
    ("Ca", 40.078),
    ("Ti", 47.867),
    ("Cr", 51.996),
    ("Mn", 54.938),
    ("Fe", 55.845),
    ("Co", 58.933),
    ("Ni", 58.693),
    ("Cu", 63.546),
    ("Zn", 65.38),
    ("Se", 78.971),
    ("Br", 79.904),
    ("Kr", 83.798),
    ("Rb", 85.468),
    ("Sr", 87.62),
    ("Mo", 95.96),
    ("Ag", 107.87),
    ("Cd", 112.41),
    ("Sn", 118.71),
    ("I", 126.9),
    ("Xe", 131.29),
    ("Cs", 132.91),
    ("Ba", 137.33),
    ("Pt", 195.08),
    ("Au", 196.97),
    ("Hg", 200.59),
    ("Pb", 207.2),
    ("U", 238.03),
];

/// Returns the canonical symbol for `symbol`, matched case-insensitively.
pub fn canonical_symbol(symbol: &str) -> Option<&'static str> {
    ELEMENTS
        .iter()
        .find(|(s, _)| s.eq_ignore_ascii_case(symbol))
        .map(|(s, _)| *s)
}

/// Standard atomic mass of an element symbol (case-insensitive).
pub fn atomic_mass(symbol: &str) -> Option<f64> {
    ELEMENTS
        .iter()
        .find(|(s, _)| s.eq_ignore_ascii_case(symbol))
        .map(|(_, m)| *m)
}

/// Guesses an element from an atom name.
///
/// Digits and punctuation are ignored. The full alphabetic part is tried
/// first, then its first letter, so `Cl1` is chlorine but `CA` (an alpha
/// carbon in most naming schemes) is only calcium when spelled `Ca`.
pub fn guess_element(name: &str) -> Option<&'static str> {
    let letters: String = name.chars().filter(|c| c.is_ascii_alphabetic()).collect();
    let first = letters.chars().next()?;

    let exact = ELEMENTS.iter().find(|(s, _)| *s == letters).map(|(s, _)| *s);
    let two_letter_title = letters.len() == 2
        && first.is_ascii_uppercase()
        && letters[1..].chars().all(|c| c.is_ascii_lowercase());

    match exact {
        Some(symbol) if letters.len() == 1 || two_letter_title => Some(symbol),
        _ => canonical_symbol(&first.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_are_matched_case_insensitively() {
        assert_eq!(canonical_symbol("cl"), Some("Cl"));
        assert_eq!(canonical_symbol("FE"), Some("Fe"));
        assert_eq!(canonical_symbol("Xx"), None);
    }

    #[test]
    fn masses_for_common_elements() {
        assert_eq!(atomic_mass("C"), Some(12.011));
        assert_eq!(atomic_mass("o"), Some(15.999));
        assert_eq!(atomic_mass("Q"), None);
    }

    #[test]
    fn guesses_from_atom_names() {
        assert_eq!(guess_element("N"), Some("N"));
        assert_eq!(guess_element("Cl1"), Some("Cl"));
        assert_eq!(guess_element("Ca"), Some("Ca"));
        assert_eq!(guess_element("CA"), Some("C"));
        assert_eq!(guess_element("CE"), Some("C"));
        assert_eq!(guess_element("HW1"), Some("H"));
        assert_eq!(guess_element("OW"), Some("O"));
        assert_eq!(guess_element("123"), None);
        assert_eq!(guess_element("X"), None);
    }
}
