// Case canonicalization for case-insensitive matching
// Both sides of every comparison are mapped through `canonicalize`
// before being compared.

/// Map `c` to its canonical case form.
///
/// In unicode mode the canonical form is the simple lowercase mapping;
/// code points whose lowercase expands to more than one character fold
/// to themselves. Outside unicode mode the canonical form is the
/// uppercase mapping, except that a non-ASCII character whose uppercase
/// would land in ASCII keeps its original identity.
pub fn canonicalize(c: char, unicode: bool) -> char {
    if unicode {
        // Lowercase code points whose simple case folding differs from
        // their own identity (CaseFolding.txt C entries).
        match c {
            '\u{17f}' => 's',     // long s
            '\u{3c2}' => '\u{3c3}', // final sigma
            '\u{3d0}' => '\u{3b2}', // beta symbol
            '\u{3d1}' => '\u{3b8}', // theta symbol
            '\u{3d5}' => '\u{3c6}', // phi symbol
            '\u{3d6}' => '\u{3c0}', // pi symbol
            '\u{3f0}' => '\u{3ba}', // kappa symbol
            '\u{3f1}' => '\u{3c1}', // rho symbol
            '\u{3f5}' => '\u{3b5}', // lunate epsilon symbol
            '\u{1e9b}' => '\u{1e61}', // long s with dot above
            _ => single_char(c.to_lowercase()).unwrap_or(c),
        }
    } else {
        match single_char(c.to_uppercase()) {
            Some(up) if up.is_ascii() && !c.is_ascii() => c,
            Some(up) => up,
            None => c,
        }
    }
}

fn single_char(mut iter: impl Iterator<Item = char>) -> Option<char> {
    let first = iter.next()?;
    if iter.next().is_none() { Some(first) } else { None }
}
