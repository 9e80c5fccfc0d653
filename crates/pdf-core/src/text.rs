//! Text rendering utilities

/// Context for rendering text
pub struct TextRenderContext {
    /// PDF font resource name (e.g., "F1")
    pub font_name: String,
    /// Font size in points
    pub font_size: f32,
}

/// Generate PDF operators for text insertion
///
/// Creates the text operators (BT, Tf, Td, Tj, ET) that draw `text_hex`
/// with its baseline starting at (`x`, `y`) in PDF coordinates. Text is
/// drawn in the default fill colour (black).
pub fn generate_text_operators(
    text_hex: &str,
    x: f64,
    y: f64,
    ctx: &TextRenderContext,
) -> Vec<u8> {
    let mut ops = String::new();
    ops.push_str("BT\n");
    ops.push_str(&format!("/{} {} Tf\n", ctx.font_name, ctx.font_size));
    ops.push_str(&format!("{x:.2} {y:.2} Td\n"));
    ops.push_str(&format!("{text_hex} Tj\n"));
    ops.push_str("ET\n");

    ops.into_bytes()
}
