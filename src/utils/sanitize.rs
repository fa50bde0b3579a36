/// Strips every tag, keeping only the text content, and trims the result.
pub fn clean_text(input: &str) -> String {
    ammonia::Builder::empty().clean(input).to_string().trim().to_string()
}

pub fn clean_optional(input: Option<String>) -> Option<String> {
    input
        .map(|text| clean_text(&text))
        .filter(|text| !text.is_empty())
}
