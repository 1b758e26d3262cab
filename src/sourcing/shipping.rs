/// Extract the leading day count from a free-text shipping estimate.
///
/// Takes the first run of ASCII digits: "3-5 days" -> 3, "ships in 7d" -> 7.
/// Returns None when the text carries no number at all.
pub fn parse_shipping_days(text: &str) -> Option<u32> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();

    // Absurdly long digit runs saturate instead of failing
    Some(digits.parse::<u32>().unwrap_or(u32::MAX))
}
