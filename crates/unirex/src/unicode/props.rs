// General-category property classes for \p{..} / \P{..}
// Categories are folded into a 30-bit mask so a class can hold any
// union of them in one word.

use unicode_general_category::{get_general_category, GeneralCategory};

fn bit_index(cat: GeneralCategory) -> u32 {
    use GeneralCategory::*;
    match cat {
        UppercaseLetter => 0,
        LowercaseLetter => 1,
        TitlecaseLetter => 2,
        ModifierLetter => 3,
        OtherLetter => 4,
        NonspacingMark => 5,
        SpacingMark => 6,
        EnclosingMark => 7,
        DecimalNumber => 8,
        LetterNumber => 9,
        OtherNumber => 10,
        ConnectorPunctuation => 11,
        DashPunctuation => 12,
        OpenPunctuation => 13,
        ClosePunctuation => 14,
        InitialPunctuation => 15,
        FinalPunctuation => 16,
        OtherPunctuation => 17,
        MathSymbol => 18,
        CurrencySymbol => 19,
        ModifierSymbol => 20,
        OtherSymbol => 21,
        SpaceSeparator => 22,
        LineSeparator => 23,
        ParagraphSeparator => 24,
        Control => 25,
        Format => 26,
        Surrogate => 27,
        PrivateUse => 28,
        Unassigned => 29,
        _ => unreachable!(),
    }
}

/// Mask bit of `c`'s general category.
pub(crate) fn category_bit(c: char) -> u32 {
    1 << bit_index(get_general_category(c))
}

const fn bits(indices: &[u32]) -> u32 {
    let mut mask = 0;
    let mut i = 0;
    while i < indices.len() {
        mask |= 1 << indices[i];
        i += 1;
    }
    mask
}

/// Every category bit set; the complement of a mask stays within this.
pub(crate) const MASK_ALL: u32 = (1 << 30) - 1;

const MASK_L: u32 = bits(&[0, 1, 2, 3, 4]);
const MASK_M: u32 = bits(&[5, 6, 7]);
const MASK_N: u32 = bits(&[8, 9, 10]);
const MASK_P: u32 = bits(&[11, 12, 13, 14, 15, 16, 17]);
const MASK_S: u32 = bits(&[18, 19, 20, 21]);
const MASK_Z: u32 = bits(&[22, 23, 24]);
const MASK_C: u32 = bits(&[25, 26, 27, 28, 29]);

/// Resolve a general-category name (short form, one-letter group, or
/// long alias) to its mask.
pub(crate) fn mask_for_name(name: &str) -> Option<u32> {
    let mask = match name {
        "L" | "Letter" => MASK_L,
        "Lu" | "Uppercase_Letter" => 1 << 0,
        "Ll" | "Lowercase_Letter" => 1 << 1,
        "Lt" | "Titlecase_Letter" => 1 << 2,
        "Lm" | "Modifier_Letter" => 1 << 3,
        "Lo" | "Other_Letter" => 1 << 4,
        "LC" | "Cased_Letter" => bits(&[0, 1, 2]),
        "M" | "Mark" => MASK_M,
        "Mn" | "Nonspacing_Mark" => 1 << 5,
        "Mc" | "Spacing_Mark" => 1 << 6,
        "Me" | "Enclosing_Mark" => 1 << 7,
        "N" | "Number" => MASK_N,
        "Nd" | "Decimal_Number" => 1 << 8,
        "Nl" | "Letter_Number" => 1 << 9,
        "No" | "Other_Number" => 1 << 10,
        "P" | "Punctuation" => MASK_P,
        "Pc" | "Connector_Punctuation" => 1 << 11,
        "Pd" | "Dash_Punctuation" => 1 << 12,
        "Ps" | "Open_Punctuation" => 1 << 13,
        "Pe" | "Close_Punctuation" => 1 << 14,
        "Pi" | "Initial_Punctuation" => 1 << 15,
        "Pf" | "Final_Punctuation" => 1 << 16,
        "Po" | "Other_Punctuation" => 1 << 17,
        "S" | "Symbol" => MASK_S,
        "Sm" | "Math_Symbol" => 1 << 18,
        "Sc" | "Currency_Symbol" => 1 << 19,
        "Sk" | "Modifier_Symbol" => 1 << 20,
        "So" | "Other_Symbol" => 1 << 21,
        "Z" | "Separator" => MASK_Z,
        "Zs" | "Space_Separator" => 1 << 22,
        "Zl" | "Line_Separator" => 1 << 23,
        "Zp" | "Paragraph_Separator" => 1 << 24,
        "C" | "Other" => MASK_C,
        "Cc" | "Control" => 1 << 25,
        "Cf" | "Format" => 1 << 26,
        "Cs" | "Surrogate" => 1 << 27,
        "Co" | "Private_Use" => 1 << 28,
        "Cn" | "Unassigned" => 1 << 29,
        _ => return None,
    };
    Some(mask)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_fall_under_letter_group() {
        let mask = mask_for_name("L").unwrap();
        assert_ne!(mask & category_bit('a'), 0);
        assert_ne!(mask & category_bit('Ж'), 0);
        assert_eq!(mask & category_bit('7'), 0);
    }

    #[test]
    fn digits_are_nd() {
        let mask = mask_for_name("Nd").unwrap();
        assert_ne!(mask & category_bit('7'), 0);
        assert_eq!(mask & category_bit('x'), 0);
    }

    #[test]
    fn unknown_name_is_rejected() {
        assert!(mask_for_name("Banana").is_none());
    }
}
