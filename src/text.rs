//! Text measurement for overlays drawn without font metrics.

/// Heuristic pixel width of `text` (plotters cannot measure text without a font).
pub fn estimate_text_width_px(text: &str, font_px: u32) -> u32 {
    ((text.chars().count() as f32) * (font_px as f32) * 0.60).ceil() as u32
}

/// Truncate to fit `max_px`, ending with a single ellipsis when cut.
pub fn truncate_to_width(text: &str, font_px: u32, max_px: u32) -> String {
    if estimate_text_width_px(text, font_px) <= max_px {
        return text.to_string();
    }
    let mut out = String::new();
    for ch in text.chars() {
        out.push(ch);
        if estimate_text_width_px(&out, font_px) + estimate_text_width_px("…", font_px) > max_px {
            out.pop();
            break;
        }
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate_to_width("Santos", 13, 200), "Santos");
    }

    #[test]
    fn long_text_gets_one_ellipsis() {
        let name = "São José dos Campos e Região Metropolitana do Vale";
        let cut = truncate_to_width(name, 13, 120);
        assert!(cut.ends_with('…'));
        assert_eq!(cut.matches('…').count(), 1);
        assert!(estimate_text_width_px(&cut, 13) <= 120);
    }
}
