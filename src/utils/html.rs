use ammonia;

/// Sanitizes member-supplied text that will be stored and later rendered
/// (survey comments, lesson overview/reading/discussion fields).
///
/// Whitelist-based: safe inline tags survive, script/iframe and event
/// attributes are stripped. Fail-safe against stored XSS since the rendering
/// layer lives outside this service.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_script_tags() {
        let cleaned = clean_html("great lesson<script>alert(1)</script>");
        assert_eq!(cleaned, "great lesson");
    }
}
